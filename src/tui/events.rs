use crate::core::geo::GeoResponse;
use crate::core::submission::{SubmissionReceipt, SubmitError};

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for notification TTLs.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// A cascade fetch finished.
    GeoLoaded(GeoResponse),
    /// The submit call finished.
    SubmitFinished(Result<SubmissionReceipt, SubmitError>),
    /// Username availability probe finished.
    UsernameChecked {
        username: String,
        result: Result<bool, SubmitError>,
    },
    /// A resolved action to execute.
    Action(Action),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Wizard
    NextStep,
    PreviousStep,
    Submit,
    CheckUsername,

    // Modals
    ShowHelp,
    CloseHelp,

    // Application
    Quit,
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

impl Notification {
    /// A notification to send through the event channel. The overlay assigns
    /// the id and lifetime.
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 0,
        }
    }
}
