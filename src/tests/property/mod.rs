//! Property-based tests for the profile wizard
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Running Property Tests
//!
//! Run all property tests:
//! ```sh
//! cargo test property --release
//! ```
//!
//! Run a specific property test module:
//! ```sh
//! cargo test property::cascade_props --release
//! ```
//!
//! ## Test Modules
//!
//! - `validator_props`: Tests for the field validators
//!   - Usernames of 4-20 non-space characters are accepted
//!   - Out-of-range lengths and embedded whitespace are rejected
//!   - Password errors follow the length, special, digit order
//!   - Strength is Strong exactly when the password is valid
//!   - Current password is required exactly when a new one is set
//!   - Step 3 reports exactly the empty location fields
//!   - Photo type is checked before size
//!
//! - `cascade_props`: Tests for the geo cascade loader
//!   - Only the newest fetch of a level is ever applied
//!   - Changing a parent clears every descendant
//!   - Applied options are sorted by name
//!   - A selection never holds a child without its parent

mod cascade_props;
