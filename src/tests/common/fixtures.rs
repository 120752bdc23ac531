//! Test Fixtures
//!
//! Provides shared test helpers for creating test databases, step data,
//! a controller parked on the Review step, and photo payloads.

use tempfile::TempDir;

use crate::core::profile::{
    LocationSelection, PersonalData, Photo, Plan, PreferencesData, Profession, ProfessionalData,
    StepData, WizardController, WizardStep,
};
use crate::core::submission::SubmissionReceipt;
use crate::database::{Database, NewProfile};

// =============================================================================
// Database Fixtures
// =============================================================================

/// Create a test database in a temporary directory.
/// Returns both the database and the TempDir (which must be kept alive).
pub async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::new(temp_dir.path())
        .await
        .expect("Failed to create test database");
    (db, temp_dir)
}

/// A store row for `username` with the rest of the fields filled in.
pub fn sample_new_profile(username: &str) -> NewProfile {
    NewProfile {
        username: username.to_string(),
        password: "abcdef1!".to_string(),
        profession: Some("Developer".to_string()),
        company_name: None,
        address1: Some("1 Main Rd".to_string()),
        country: Some("US".to_string()),
        state: Some("CA".to_string()),
        city: Some("Los Angeles".to_string()),
        plan: Some("Pro".to_string()),
        newsletter: false,
        photo: String::new(),
    }
}

// =============================================================================
// Step Data Fixtures
// =============================================================================

pub fn personal_data(username: &str) -> StepData {
    StepData::Personal(PersonalData {
        photo: None,
        photo_preview: None,
        username: username.to_string(),
        current_password: String::new(),
        new_password: String::new(),
    })
}

pub fn professional_data(profession: Profession, company: Option<&str>) -> StepData {
    StepData::Professional(ProfessionalData {
        profession,
        company_name: company.map(str::to_string),
        address1: "1 Main Rd".to_string(),
    })
}

pub fn preferences_data(country: &str, state: &str, city: &str) -> StepData {
    StepData::Preferences(PreferencesData {
        location: LocationSelection::from_parts(country, state, city),
        plan: Plan::Pro,
        newsletter: false,
    })
}

/// A controller advanced through the three input steps with the values of
/// a typical developer profile.
pub fn controller_at_review(username: &str) -> WizardController {
    let mut controller = WizardController::new();
    controller
        .advance(personal_data(username))
        .expect("personal step");
    controller
        .advance(professional_data(Profession::Developer, None))
        .expect("professional step");
    controller
        .advance(preferences_data("US", "CA", "Los Angeles"))
        .expect("preferences step");
    assert_eq!(controller.step(), WizardStep::Review);
    controller
}

pub fn receipt(user_id: &str) -> SubmissionReceipt {
    SubmissionReceipt {
        user_id: user_id.to_string(),
    }
}

// =============================================================================
// Photo Fixtures
// =============================================================================

/// Bytes that sniff as PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 24]);
    bytes
}

/// Bytes that sniff as JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(&[0u8; 28]);
    bytes
}

/// Bytes that sniff as GIF, which is not accepted.
pub fn gif_bytes() -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&[0u8; 26]);
    bytes
}

pub fn sample_photo() -> Photo {
    Photo::from_bytes("me.png", png_bytes()).expect("PNG fixture is a valid photo")
}
