//! In-crate test suites
//!
//! - `common`: shared fixtures (temporary databases, sample drafts, photo bytes)
//! - `property`: proptest invariants for validators and the geo cascade
//! - `unit`: controller flows and HTTP clients/routes against mock servers
//! - `database`: profile and geography storage

mod common;
mod database;
mod property;
mod unit;
