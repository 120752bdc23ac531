//! Profile Creation Wizard
//!
//! Guides a user through building a profile in four steps:
//! 1. Personal - Photo, username, optional password change
//! 2. Professional - Profession, company (entrepreneurs only), address
//! 3. Preferences - Country/state/city cascade, plan, newsletter
//! 4. Review - Read-only summary and submission
//!
//! # Design Principles
//!
//! - **Progressive**: Moving back keeps everything entered so far
//! - **Local validation**: Field errors block only the owning step
//! - **Confirmed submission**: The wizard finishes only on a confirmed success

mod controller;
mod forms;
mod review;
mod types;
pub mod validators;

pub use controller::*;
pub use forms::*;
pub use review::*;
pub use types::*;
pub use validators::{PasswordCheck, PasswordStrength, PhotoError};
