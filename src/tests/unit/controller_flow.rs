//! Wizard Controller Flow Tests
//!
//! Multi-step scenarios through [`WizardController`]:
//! - Navigating back and forth keeps previously entered data
//! - Submitting through a mocked sink reaches the terminal state
//! - A rejected submit keeps the draft and allows a retry
//! - An in-flight submit blocks a second submit and going back
//! - Profession changes drop a stale company name from the payload

use crate::core::profile::{
    ActiveForm, Field, PersonalData, Profession, StepData, SubmissionStatus, WizardController,
    WizardError, WizardStep,
};
use crate::core::submission::{MockSubmissionSink, SubmitError};
use crate::tests::common::*;

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_back_and_forth_keeps_data() {
    let mut controller = WizardController::new();
    controller.advance(personal_data("alice123")).unwrap();
    controller
        .advance(professional_data(Profession::Entrepreneur, Some("Acme")))
        .unwrap();
    assert_eq!(controller.step(), WizardStep::Preferences);

    assert_eq!(controller.retreat().unwrap(), WizardStep::Professional);
    match controller.open_form() {
        ActiveForm::Professional(form) => {
            assert_eq!(form.profession, Some(Profession::Entrepreneur));
            assert_eq!(form.company_name, "Acme");
            assert_eq!(form.address1, "1 Main Rd");
        }
        other => panic!("expected professional form, got {:?}", other.step()),
    }

    assert_eq!(controller.retreat().unwrap(), WizardStep::Personal);
    let mut form = controller.open_form();
    match &form {
        ActiveForm::Personal(personal) => assert_eq!(personal.username, "alice123"),
        other => panic!("expected personal form, got {:?}", other.step()),
    }

    // Re-advancing an untouched, pre-filled form succeeds
    assert_eq!(controller.advance_form(&mut form).unwrap(), WizardStep::Professional);
    assert_eq!(controller.state().company_name.as_deref(), Some("Acme"));
    assert!(!controller.can_submit());
}

#[test]
fn test_steps_cannot_be_skipped() {
    let mut controller = WizardController::new();
    let err = controller
        .advance(preferences_data("US", "CA", "Los Angeles"))
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { .. }));
    assert_eq!(controller.step(), WizardStep::Personal);
    assert_eq!(controller.progress_percent(), 0);
}

#[test]
fn test_failed_form_advance_touches_every_field() {
    let mut controller = WizardController::new();
    let mut form = controller.open_form();
    assert!(form.visible_errors().is_empty());

    let err = controller.advance_form(&mut form).unwrap_err();
    match err {
        WizardError::Validation(errors) => assert!(errors.contains(Field::Username)),
        other => panic!("unexpected error: {other}"),
    }
    assert!(form.visible_errors().contains(Field::Username));
    assert_eq!(controller.step(), WizardStep::Personal);
}

#[test]
fn test_progress_tracks_completed_steps() {
    let controller = controller_at_review("alice123");
    assert_eq!(controller.progress_percent(), 75);
    assert!(controller.is_step_completed(WizardStep::Preferences));
    assert!(!controller.is_step_completed(WizardStep::Review));
    assert!(controller.can_submit());
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_through_sink() {
    let mut controller = controller_at_review("alice123");

    let mut sink = MockSubmissionSink::new();
    sink.expect_submit()
        .withf(|payload| {
            payload.fields.username == "alice123"
                && payload.fields.city == "Los Angeles"
                && !payload.is_multipart()
        })
        .times(1)
        .returning(|_| Ok(receipt("u-1")));

    let user_id = controller.submit_with(&sink).await.unwrap();
    assert_eq!(user_id, "u-1");
    assert!(controller.is_submitted());
    assert_eq!(controller.user_id(), Some("u-1"));
    assert_eq!(controller.progress_percent(), 100);

    // Terminal: nothing moves any more
    assert_eq!(controller.retreat(), Err(WizardError::AlreadySubmitted));
    assert_eq!(controller.begin_submit().unwrap_err(), WizardError::AlreadySubmitted);
}

#[tokio::test]
async fn test_rejected_submit_keeps_draft_and_retries() {
    let mut controller = controller_at_review("alice123");
    let draft = controller.state().clone();

    let mut rejecting = MockSubmissionSink::new();
    rejecting
        .expect_submit()
        .times(1)
        .returning(|_| Err(SubmitError::Rejected("duplicate username".to_string())));

    let err = controller.submit_with(&rejecting).await.unwrap_err();
    assert_eq!(err, WizardError::Submission("duplicate username".to_string()));
    assert_eq!(controller.submit_error(), Some("duplicate username"));
    assert_eq!(controller.step(), WizardStep::Review);
    assert_eq!(controller.state(), &draft);
    assert!(controller.can_submit());

    let mut accepting = MockSubmissionSink::new();
    accepting
        .expect_submit()
        .times(1)
        .returning(|_| Ok(receipt("u-2")));

    assert_eq!(controller.submit_with(&accepting).await.unwrap(), "u-2");
    assert!(controller.submit_error().is_none());
}

#[test]
fn test_in_flight_submit_blocks_resubmit_and_retreat() {
    let mut controller = controller_at_review("alice123");
    let draft = controller.state().clone();

    controller.begin_submit().unwrap();
    assert!(controller.is_submitting());
    assert!(!controller.can_submit());

    assert_eq!(controller.begin_submit().unwrap_err(), WizardError::SubmitInFlight);
    assert_eq!(controller.retreat(), Err(WizardError::SubmitInFlight));
    assert_eq!(controller.step(), WizardStep::Review);
    assert_eq!(controller.state(), &draft);
    assert_eq!(controller.submission(), &SubmissionStatus::InFlight);

    // The original request still completes normally
    assert_eq!(controller.finish_submit(Ok(receipt("u-1"))).unwrap(), "u-1");
    assert!(controller.is_submitted());
}

#[test]
fn test_retreat_from_review_clears_failure() {
    let mut controller = controller_at_review("alice123");
    controller.begin_submit().unwrap();
    controller
        .finish_submit(Err(SubmitError::Transport("connection refused".to_string())))
        .unwrap_err();
    assert!(matches!(controller.submission(), SubmissionStatus::Failed(_)));

    controller.retreat().unwrap();
    assert_eq!(controller.submission(), &SubmissionStatus::Idle);
}

#[test]
fn test_profession_change_drops_company_from_payload() {
    let mut controller = WizardController::new();
    controller.advance(personal_data("alice123")).unwrap();
    controller
        .advance(professional_data(Profession::Entrepreneur, Some("Acme")))
        .unwrap();
    controller.retreat().unwrap();
    controller
        .advance(professional_data(Profession::Student, Some("Acme")))
        .unwrap();
    controller
        .advance(preferences_data("US", "CA", "Los Angeles"))
        .unwrap();

    let payload = controller.begin_submit().unwrap();
    assert_eq!(payload.fields.profession, Some(Profession::Student));
    assert_eq!(payload.fields.company_name, None);
}

#[tokio::test]
async fn test_photo_makes_submission_multipart() {
    let mut controller = WizardController::new();
    controller
        .advance(StepData::Personal(PersonalData {
            photo: Some(sample_photo()),
            photo_preview: Some("memory:me.png".to_string()),
            username: "alice123".to_string(),
            current_password: "old-secret".to_string(),
            new_password: "abcdef1!".to_string(),
        }))
        .unwrap();
    controller
        .advance(professional_data(Profession::Developer, None))
        .unwrap();
    controller
        .advance(preferences_data("US", "CA", "Los Angeles"))
        .unwrap();

    let mut sink = MockSubmissionSink::new();
    sink.expect_submit()
        .withf(|payload| {
            payload.is_multipart()
                && payload.photo.as_ref().is_some_and(|p| p.file_name == "me.png")
                && payload.fields.new_password.as_deref() == Some("abcdef1!")
        })
        .times(1)
        .returning(|_| Ok(receipt("u-3")));

    assert_eq!(controller.submit_with(&sink).await.unwrap(), "u-3");
}
