//! Geography lookups for the location cascade.

mod cascade;
mod client;
mod types;

pub use cascade::*;
pub use client::*;
pub use types::*;
