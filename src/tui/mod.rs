//! Terminal front end for the profile wizard.

pub mod app;
pub mod events;
pub mod services;
pub mod theme;
pub mod views;
pub mod widgets;

pub use app::AppState;
