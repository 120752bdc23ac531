//! Profile API client
//!
//! Submits finalized profiles and checks username availability against the
//! backend service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::payload::SubmissionPayload;
use crate::config::ApiConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Network error: {0}")]
    Transport(String),

    /// Message reported by the server, shown verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SubmitError::InvalidResponse(err.to_string())
        } else {
            SubmitError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SubmitError>;

/// Confirmation of a stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub user_id: String,
}

/// Terminal destination of a finalized profile.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt>;
}

/// Optional availability probe. Not consulted when advancing steps.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UsernameAvailability: Send + Sync {
    async fn check_username(&self, username: &str) -> Result<bool>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    available: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct AvailabilityRequest<'a> {
    username: &'a str,
}

pub struct ProfileApiClient {
    base_url: String,
    client: Client,
}

impl ProfileApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn multipart_form(payload: &SubmissionPayload) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for (key, value) in payload.fields.text_parts() {
            form = form.text(key, value);
        }
        if let Some(photo) = &payload.photo {
            let part = multipart::Part::bytes(photo.bytes.to_vec())
                .file_name(photo.file_name.clone())
                .mime_str(photo.mime.mime_type())
                .map_err(|e| SubmitError::Transport(e.to_string()))?;
            form = form.part("photo", part);
        }
        Ok(form)
    }
}

/// Decode a submit response. Anything but a 2xx with `success: true` is a
/// rejection carrying the server's message.
async fn read_receipt(response: Response) -> Result<SubmissionReceipt> {
    let status = response.status();
    let text = response.text().await?;
    let body: SubmitResponse = serde_json::from_str(&text).unwrap_or_default();

    if status.is_success() && body.success {
        return body
            .user_id
            .map(|user_id| SubmissionReceipt { user_id })
            .ok_or_else(|| SubmitError::InvalidResponse("missing userId".to_string()));
    }

    let message = body
        .error
        .filter(|e| !e.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    Err(SubmitError::Rejected(message))
}

#[async_trait]
impl SubmissionSink for ProfileApiClient {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt> {
        let url = format!("{}/submit-profile", self.base_url);
        let request = self.client.post(&url);

        let request = if payload.is_multipart() {
            request.multipart(Self::multipart_form(&payload)?)
        } else {
            request.json(&payload.fields)
        };

        tracing::info!(
            username = %payload.fields.username,
            multipart = payload.is_multipart(),
            "Submitting profile"
        );
        let receipt = read_receipt(request.send().await?).await;
        match &receipt {
            Ok(r) => tracing::info!(user_id = %r.user_id, "Profile stored"),
            Err(e) => tracing::warn!(error = %e, "Profile submission failed"),
        }
        receipt
    }
}

#[async_trait]
impl UsernameAvailability for ProfileApiClient {
    async fn check_username(&self, username: &str) -> Result<bool> {
        let url = format!("{}/check-username", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AvailabilityRequest { username })
            .send()
            .await?;

        let status = response.status();
        let body: AvailabilityResponse = response.json().await?;
        if !status.is_success() {
            return Err(SubmitError::Rejected(
                body.error.unwrap_or_else(|| status.to_string()),
            ));
        }
        Ok(body.available)
    }
}
