//! Common Test Utilities
//!
//! Shared test helpers and fixtures used across test modules:
//! - Database fixture creation
//! - Sample wizard drafts and step data
//! - Minimal image payloads for photo handling

pub mod fixtures;

pub use fixtures::*;
