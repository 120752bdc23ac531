//! Submission sink and username availability check.

mod client;
mod payload;

pub use client::*;
pub use payload::*;
