//! Profile API Client Unit Tests
//!
//! Tests for [`ProfileApiClient`] against a wiremock server:
//! - JSON bodies for photo-less submissions
//! - Multipart bodies when a photo is attached
//! - Server rejections surfaced verbatim, with a status-text fallback
//! - Username availability probes

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::profile::{PersonalData, Profession, StepData, WizardController};
use crate::core::submission::{
    ProfileApiClient, SubmissionPayload, SubmissionSink, SubmitError, UsernameAvailability,
};
use crate::tests::common::*;

fn client_for(server: &MockServer) -> ProfileApiClient {
    ProfileApiClient::new(&server.uri(), Duration::from_secs(5)).expect("client")
}

fn json_payload() -> SubmissionPayload {
    controller_at_review("alice123")
        .begin_submit()
        .expect("payload")
}

fn photo_payload() -> SubmissionPayload {
    let mut controller = WizardController::new();
    controller
        .advance(StepData::Personal(PersonalData {
            photo: Some(sample_photo()),
            photo_preview: None,
            username: "alice123".to_string(),
            current_password: String::new(),
            new_password: String::new(),
        }))
        .unwrap();
    controller
        .advance(professional_data(Profession::Entrepreneur, Some("Acme")))
        .unwrap();
    controller
        .advance(preferences_data("US", "CA", "Los Angeles"))
        .unwrap();
    controller.begin_submit().unwrap()
}

async fn mount_submit(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/submit-profile"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// Submit
// =============================================================================

#[tokio::test]
async fn test_submit_json_without_photo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit-profile"))
        .and(header_regex("content-type", "^application/json"))
        .and(body_partial_json(json!({
            "username": "alice123",
            "profession": "Developer",
            "address1": "1 Main Rd",
            "country": "US",
            "state": "CA",
            "city": "Los Angeles",
            "plan": "Pro",
            "newsletter": false,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "userId": "u-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server).submit(json_payload()).await.unwrap();
    assert_eq!(receipt.user_id, "u-1");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: Value = requests[0].body_json().unwrap();
    let object = body.as_object().unwrap();
    assert!(!object.contains_key("photo"));
    assert!(!object.contains_key("photoPreview"));
    assert!(!object.contains_key("currentPassword"));
    assert!(!object.contains_key("newPassword"));
    assert!(!object.contains_key("companyName"));
}

#[tokio::test]
async fn test_submit_multipart_with_photo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit-profile"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "userId": "u-2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server).submit(photo_payload()).await.unwrap();
    assert_eq!(receipt.user_id, "u-2");

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body).to_lowercase();
    assert!(body.contains("name=\"photo\"; filename=\"me.png\""));
    assert!(body.contains("content-type: image/png"));
    assert!(body.contains("name=\"companyname\""));
    assert!(body.contains("acme"));
    assert!(body.contains("name=\"newsletter\""));
    assert!(!body.contains("name=\"newpassword\""));
}

#[tokio::test]
async fn test_rejection_message_verbatim() {
    let server = MockServer::start().await;
    mount_submit(&server, 400, json!({ "success": false, "error": "duplicate username" })).await;

    let err = client_for(&server).submit(json_payload()).await.unwrap_err();
    assert_eq!(err, SubmitError::Rejected("duplicate username".to_string()));
    assert_eq!(err.to_string(), "duplicate username");
}

#[tokio::test]
async fn test_rejection_falls_back_to_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit-profile"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = client_for(&server).submit(json_payload()).await.unwrap_err();
    assert_eq!(err, SubmitError::Rejected("Internal Server Error".to_string()));
}

#[tokio::test]
async fn test_success_flag_false_is_rejection() {
    let server = MockServer::start().await;
    mount_submit(&server, 200, json!({ "success": false, "error": "Username required" })).await;

    let err = client_for(&server).submit(json_payload()).await.unwrap_err();
    assert_eq!(err, SubmitError::Rejected("Username required".to_string()));
}

#[tokio::test]
async fn test_success_without_user_id_is_invalid() {
    let server = MockServer::start().await;
    mount_submit(&server, 200, json!({ "success": true })).await;

    let err = client_for(&server).submit(json_payload()).await.unwrap_err();
    assert!(matches!(err, SubmitError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Reserve a port, then release it so connections are refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ProfileApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.submit(json_payload()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Transport(_)), "got {err:?}");
}

// =============================================================================
// Username availability
// =============================================================================

#[tokio::test]
async fn test_check_username_available() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check-username"))
        .and(body_json(json!({ "username": "alice123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "available": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client_for(&server).check_username("alice123").await.unwrap());
}

#[tokio::test]
async fn test_check_username_taken() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check-username"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "available": false })))
        .mount(&server)
        .await;

    assert!(!client_for(&server).check_username("alice123").await.unwrap());
}

#[tokio::test]
async fn test_check_username_error_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check-username"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "available": false, "error": "Username required" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).check_username("").await.unwrap_err();
    assert_eq!(err, SubmitError::Rejected("Username required".to_string()));
}
