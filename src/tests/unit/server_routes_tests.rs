//! Backend Route Unit Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`:
//! - Health check
//! - Profile submission as JSON and multipart, including rejections
//! - Username availability
//! - Geography listings and their required query parameters

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::database::{CityRecord, CountryRecord, Database, GeographyOps, ProfileOps, StateRecord};
use crate::server::{router, ServerState};
use crate::tests::common::*;

const BOUNDARY: &str = "profile-boundary";

async fn test_app() -> (Router, Database, TempDir) {
    let (db, temp) = create_test_db().await;
    let app = router(Arc::new(ServerState::new(db.clone())));
    (app, db, temp)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Hand-built multipart body with text fields and an optional file part.
fn multipart_request(fields: &[(&str, &str)], photo: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, mime, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/submit-profile")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn profile_json(username: &str) -> Value {
    json!({
        "username": username,
        "newPassword": "abcdef1!",
        "profession": "Developer",
        "address1": "1 Main Rd",
        "country": "US",
        "state": "CA",
        "city": "Los Angeles",
        "plan": "Pro",
        "newsletter": false,
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _db, _temp) = test_app().await;
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("API is running".to_string()));
}

// =============================================================================
// Submit
// =============================================================================

#[tokio::test]
async fn test_submit_json_stores_profile() {
    let (app, db, _temp) = test_app().await;

    let (status, body) = send(&app, post_json("/submit-profile", profile_json("alice123"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let user_id = body["userId"].as_str().expect("userId").to_string();

    let stored = db.get_profile(&user_id).await.unwrap().expect("stored");
    assert_eq!(stored.username, "alice123");
    assert_eq!(stored.password, "abcdef1!");
    assert_eq!(stored.city.as_deref(), Some("Los Angeles"));
    assert_eq!(stored.plan.as_deref(), Some("Pro"));
    assert!(!stored.newsletter);
    assert!(stored.photo.is_empty());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let (app, _db, _temp) = test_app().await;

    let (status, _) = send(&app, post_json("/submit-profile", profile_json("alice123"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/submit-profile", profile_json("alice123"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "duplicate username" }));
}

#[tokio::test]
async fn test_missing_username_rejected() {
    let (app, db, _temp) = test_app().await;

    let (status, body) = send(&app, post_json("/submit-profile", json!({ "city": "Paris" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Username required"));
    assert!(db.list_profiles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_multipart_png_stored_as_data_uri() {
    let (app, db, _temp) = test_app().await;
    let png = png_bytes();

    let request = multipart_request(
        &[("username", "bob_2024"), ("newsletter", "true"), ("plan", "Basic")],
        Some(("me.png", "image/png", &png)),
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let stored = db.get_profile_by_username("bob_2024").await.unwrap().expect("stored");
    assert!(stored.photo.starts_with("data:image/png;base64,"));
    assert!(stored.newsletter);
    assert_eq!(stored.plan.as_deref(), Some("Basic"));
}

#[tokio::test]
async fn test_multipart_wrong_type_rejected() {
    let (app, db, _temp) = test_app().await;
    let gif = gif_bytes();

    let request = multipart_request(
        &[("username", "bob_2024")],
        Some(("anim.gif", "image/gif", &gif)),
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Only JPG/PNG allowed" }));
    assert!(!db.username_exists("bob_2024").await.unwrap());
}

// =============================================================================
// Username availability
// =============================================================================

#[tokio::test]
async fn test_check_username() {
    let (app, db, _temp) = test_app().await;
    db.create_profile(&sample_new_profile("alice123")).await.unwrap();

    let (status, body) = send(&app, post_json("/check-username", json!({ "username": "alice123" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "available": false }));

    let (_, body) = send(&app, post_json("/check-username", json!({ "username": "carol99" }))).await;
    assert_eq!(body, json!({ "available": true }));

    let (status, body) = send(&app, post_json("/check-username", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Username required"));
}

// =============================================================================
// Geography
// =============================================================================

async fn seed_geography(db: &Database) {
    for (id, name) in [("US", "United States"), ("CA", "Canada")] {
        db.save_country(&CountryRecord {
            id: id.to_string(),
            name: name.to_string(),
            iso2: Some(id.to_string()),
        })
        .await
        .unwrap();
    }
    db.save_state(&StateRecord {
        id: "US-CA".to_string(),
        country_id: "US".to_string(),
        name: "California".to_string(),
        iso2: Some("CA".to_string()),
    })
    .await
    .unwrap();
    db.save_city(&CityRecord {
        id: "110".to_string(),
        state_id: "US-CA".to_string(),
        country_id: "US".to_string(),
        name: "Los Angeles".to_string(),
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_geography_listings() {
    let (app, db, _temp) = test_app().await;
    seed_geography(&db).await;

    let (status, body) = send(&app, get("/countries")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Canada", "United States"]);

    let (_, body) = send(&app, get("/states?countryId=US")).await;
    assert_eq!(body[0]["name"], json!("California"));

    let (_, body) = send(&app, get("/cities?stateId=US-CA")).await;
    assert_eq!(body[0]["name"], json!("Los Angeles"));

    let (_, body) = send(&app, get("/states?countryId=CA")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_geography_requires_parent_id() {
    let (app, _db, _temp) = test_app().await;

    let (status, body) = send(&app, get("/states")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "countryId required" }));

    let (status, body) = send(&app, get("/cities?stateId=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "stateId required" }));
}
