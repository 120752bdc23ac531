/// Profile Wizard - four-step profile creation
///
/// Core library providing the wizard state machine, field validators, the
/// geography cascade, profile submission, a terminal front end and the
/// backend service that stores submitted profiles.

pub mod config;
pub mod core;
pub mod database;
pub mod server;
pub mod tui;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
