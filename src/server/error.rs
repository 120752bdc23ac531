use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::core::profile::PhotoError;
use crate::database::is_unique_violation;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error("duplicate username")]
    DuplicateUsername,

    #[error("{0}")]
    Database(sqlx::Error),

    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Server already running")]
    AlreadyRunning,
}

impl From<sqlx::Error> for ServerError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            ServerError::DuplicateUsername
        } else {
            ServerError::Database(err)
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Photo(_) | ServerError::DuplicateUsername => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Database(_) | ServerError::Bind { .. } | ServerError::AlreadyRunning => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
