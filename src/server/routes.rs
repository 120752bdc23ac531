//! HTTP Handlers

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::error::ServerError;
use super::ServerState;
use crate::core::profile::validators::validate_photo;
use crate::database::{GeographyOps, NewProfile, ProfileOps};

/// Body of `POST /submit-profile`, from JSON or multipart text parts.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedProfile {
    pub username: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub profession: Option<String>,
    pub company_name: Option<String>,
    pub address1: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub plan: Option<String>,
    /// `true` or the string `"true"`; anything else is false.
    pub newsletter: Option<Value>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl SubmittedProfile {
    /// Map onto a store row. The password is the new one if given, else the
    /// plain `password` field, else empty.
    pub fn into_new_profile(self, photo: String) -> Result<NewProfile, ServerError> {
        let username = present(self.username)
            .ok_or_else(|| ServerError::BadRequest("Username required".to_string()))?;
        let password = present(self.new_password)
            .or_else(|| present(self.password))
            .unwrap_or_default();
        let newsletter = match &self.newsletter {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        };

        Ok(NewProfile {
            username,
            password,
            profession: self.profession,
            company_name: self.company_name,
            address1: self.address1,
            country: self.country,
            state: self.state,
            city: self.city,
            plan: self.plan,
            newsletter,
            photo,
        })
    }
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

/// Collect text parts into a JSON object and encode the `photo` part.
async fn read_multipart(mut multipart: Multipart) -> Result<(SubmittedProfile, String), ServerError> {
    let mut fields = Map::new();
    let mut photo = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            let accepted = validate_photo(&mime, bytes.len())?;
            photo = data_uri(accepted.mime_type(), &bytes);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            fields.insert(name, Value::String(value));
        }
    }

    let profile = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    Ok((profile, photo))
}

async fn parse_submission(
    state: &Arc<ServerState>,
    request: Request,
) -> Result<(SubmittedProfile, String), ServerError> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;
        read_multipart(multipart).await
    } else {
        let Json(profile) = Json::<SubmittedProfile>::from_request(request, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;
        Ok((profile, String::new()))
    }
}

/// Health check endpoint
pub async fn index() -> &'static str {
    "API is running"
}

/// `POST /submit-profile`. Every failure is a 400 `{success:false, error}`.
pub async fn submit_profile(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let result = async {
        let (submitted, photo) = parse_submission(&state, request).await?;
        let profile = submitted.into_new_profile(photo)?;
        Ok::<_, ServerError>(state.db.create_profile(&profile).await?)
    }
    .await;

    match result {
        Ok(record) => {
            tracing::info!(user_id = %record.id, username = %record.username, "Profile created");
            Json(json!({ "success": true, "userId": record.id })).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Profile rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    #[serde(default)]
    pub username: Option<String>,
}

/// `POST /check-username`
pub async fn check_username(
    State(state): State<Arc<ServerState>>,
    body: Option<Json<UsernameQuery>>,
) -> Response {
    let username = body.and_then(|Json(q)| present(q.username));
    let Some(username) = username else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "available": false, "error": "Username required" })),
        )
            .into_response();
    };

    match state.db.username_exists(&username).await {
        Ok(exists) => Json(json!({ "available": !exists })).into_response(),
        Err(e) => {
            let err = ServerError::Database(e);
            tracing::error!(error = %err, "Username check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "available": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// `GET /countries`
pub async fn countries(State(state): State<Arc<ServerState>>) -> Result<Response, ServerError> {
    Ok(Json(state.db.list_countries().await?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct StatesQuery {
    #[serde(default, rename = "countryId")]
    pub country_id: Option<String>,
}

/// `GET /states?countryId=`
pub async fn states(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<StatesQuery>,
) -> Result<Response, ServerError> {
    let country_id = present(query.country_id)
        .ok_or_else(|| ServerError::BadRequest("countryId required".to_string()))?;
    Ok(Json(state.db.list_states(&country_id).await?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    #[serde(default, rename = "stateId")]
    pub state_id: Option<String>,
}

/// `GET /cities?stateId=`
pub async fn cities(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CitiesQuery>,
) -> Result<Response, ServerError> {
    let state_id = present(query.state_id)
        .ok_or_else(|| ServerError::BadRequest("stateId required".to_string()))?;
    Ok(Json(state.db.list_cities(&state_id).await?).into_response())
}
