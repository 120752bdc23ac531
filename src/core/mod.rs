pub mod geo;
pub mod logging;
pub mod profile;
pub mod submission;
