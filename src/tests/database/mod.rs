//! Database Tests
//!
//! Storage tests against a temporary SQLite file:
//! - `profiles`: profile CRUD and the username uniqueness constraint
//! - `geography`: reference table upserts and ordering

mod geography;
mod profiles;
