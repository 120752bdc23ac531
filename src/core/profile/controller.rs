//! Wizard Controller
//!
//! Owns the current step, the accumulated [`WizardState`] and the submission
//! status. Steps are reached only by advancing from their predecessor or by
//! retreating from their successor; nothing can skip ahead.
//!
//! Submission is split in two halves so a UI can run the network call off
//! its event loop: [`WizardController::begin_submit`] hands out the payload
//! and marks the submit in flight, and [`WizardController::finish_submit`]
//! applies the outcome. The terminal state is entered only on a confirmed
//! success.

use std::collections::BTreeSet;

use super::forms::ActiveForm;
use super::review::ReviewSummary;
use super::types::{FieldErrors, StepData, WizardError, WizardState, WizardStep};
use super::validators::{validate_location, validate_step1, validate_step2};
use crate::core::submission::{SubmissionPayload, SubmissionReceipt, SubmissionSink, SubmitError};

const TERMINAL: &str = "submitted";

/// Progress of the final submit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    InFlight,
    /// Last attempt failed; the message is shown beside the submit action.
    Failed(String),
    Submitted {
        user_id: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct WizardController {
    step: WizardStep,
    state: WizardState,
    completed: BTreeSet<WizardStep>,
    submission: SubmissionStatus,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn submission(&self) -> &SubmissionStatus {
        &self.submission
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.submission, SubmissionStatus::Submitted { .. })
    }

    pub fn is_submitting(&self) -> bool {
        self.submission == SubmissionStatus::InFlight
    }

    pub fn submit_error(&self) -> Option<&str> {
        match &self.submission {
            SubmissionStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.submission {
            SubmissionStatus::Submitted { user_id } => Some(user_id),
            _ => None,
        }
    }

    pub fn is_step_completed(&self, step: WizardStep) -> bool {
        self.completed.contains(&step)
    }

    pub fn can_go_back(&self) -> bool {
        !self.is_submitted() && !self.is_submitting() && self.step.previous().is_some()
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::Review && !self.is_submitted() && !self.is_submitting()
    }

    /// Percentage of the four steps completed (0-100).
    pub fn progress_percent(&self) -> u8 {
        let total = WizardStep::ALL.len();
        ((self.completed.len() * 100) / total) as u8
    }

    /// A fresh form for the current step, pre-populated from the draft.
    pub fn open_form(&self) -> ActiveForm {
        ActiveForm::for_step(self.step, &self.state)
    }

    pub fn review(&self) -> ReviewSummary {
        ReviewSummary::from(&self.state)
    }

    /// Merge validated step data and move to the next step.
    ///
    /// The data must belong to the current step and pass that step's
    /// validators again.
    pub fn advance(&mut self, data: StepData) -> Result<WizardStep, WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        if data.step() != self.step {
            return Err(WizardError::InvalidTransition {
                from: self.step.to_string(),
                to: data.step().to_string(),
            });
        }
        let next = self.step.next().ok_or_else(|| WizardError::InvalidTransition {
            from: self.step.to_string(),
            to: TERMINAL.to_string(),
        })?;
        validate_step_transition(self.step, next)?;

        let errors = validate_data(&data);
        if !errors.is_empty() {
            return Err(WizardError::Validation(errors));
        }

        self.state = self.state.merged(data);
        self.completed.insert(self.step);
        tracing::debug!(from = %self.step, to = %next, "Wizard advanced");
        self.step = next;
        Ok(next)
    }

    /// Run the form's advance attempt and, on success, advance the wizard.
    pub fn advance_form(&mut self, form: &mut ActiveForm) -> Result<WizardStep, WizardError> {
        if form.step() != self.step {
            return Err(WizardError::InvalidTransition {
                from: self.step.to_string(),
                to: form.step().to_string(),
            });
        }
        let data = form.try_advance().map_err(WizardError::Validation)?;
        self.advance(data)
    }

    /// Go back one step. The draft is left as is.
    pub fn retreat(&mut self) -> Result<WizardStep, WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.is_submitting() {
            return Err(WizardError::SubmitInFlight);
        }
        let previous = self.step.previous().ok_or_else(|| WizardError::InvalidTransition {
            from: self.step.to_string(),
            to: "none".to_string(),
        })?;
        validate_step_transition(self.step, previous)?;

        if self.step == WizardStep::Review {
            self.submission = SubmissionStatus::Idle;
        }
        tracing::debug!(from = %self.step, to = %previous, "Wizard retreated");
        self.step = previous;
        Ok(previous)
    }

    /// Mark a submission in flight and hand out the payload to send.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.step != WizardStep::Review {
            return Err(WizardError::InvalidTransition {
                from: self.step.to_string(),
                to: TERMINAL.to_string(),
            });
        }
        if self.is_submitting() {
            return Err(WizardError::SubmitInFlight);
        }
        self.submission = SubmissionStatus::InFlight;
        tracing::info!(username = %self.state.username, "Submission started");
        Ok(SubmissionPayload::from_state(&self.state))
    }

    /// Apply the outcome of the submission started by [`begin_submit`].
    ///
    /// [`begin_submit`]: WizardController::begin_submit
    pub fn finish_submit(
        &mut self,
        result: Result<SubmissionReceipt, SubmitError>,
    ) -> Result<String, WizardError> {
        if !self.is_submitting() {
            tracing::warn!(status = ?self.submission, "Ignoring submission result with none in flight");
            return Err(if self.is_submitted() {
                WizardError::AlreadySubmitted
            } else {
                WizardError::InvalidTransition {
                    from: self.step.to_string(),
                    to: TERMINAL.to_string(),
                }
            });
        }

        match result {
            Ok(receipt) => {
                tracing::info!(user_id = %receipt.user_id, "Profile submitted");
                self.completed.insert(WizardStep::Review);
                self.submission = SubmissionStatus::Submitted {
                    user_id: receipt.user_id.clone(),
                };
                Ok(receipt.user_id)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "Submission failed");
                self.submission = SubmissionStatus::Failed(message.clone());
                Err(WizardError::Submission(message))
            }
        }
    }

    /// Submit through `sink` and wait for the outcome.
    pub async fn submit_with(&mut self, sink: &dyn SubmissionSink) -> Result<String, WizardError> {
        let payload = self.begin_submit()?;
        let result = sink.submit(payload).await;
        self.finish_submit(result)
    }

    /// Start over with an empty draft.
    pub fn reset(&mut self) {
        tracing::debug!("Wizard reset");
        *self = Self::new();
    }
}

/// Re-run a step's validators over data about to be merged.
fn validate_data(data: &StepData) -> FieldErrors {
    match data {
        StepData::Personal(d) => validate_step1(&d.username, &d.current_password, &d.new_password),
        StepData::Professional(d) => validate_step2(
            Some(d.profession),
            d.company_name.as_deref().unwrap_or_default(),
            &d.address1,
        ),
        StepData::Preferences(d) => validate_location(&d.location),
    }
}

/// Validates that a step transition is allowed: staying put, or exactly one
/// step forward or back.
pub fn validate_step_transition(from: WizardStep, to: WizardStep) -> Result<(), WizardError> {
    if from == to || from.next() == Some(to) || from.previous() == Some(to) {
        return Ok(());
    }
    Err(WizardError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    })
}
