//! Geography provider contract and shared types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// One selectable entry in a country, state or city list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoOption {
    /// ISO code for countries and states, numeric id for cities.
    pub code: String,
    pub name: String,
}

impl GeoOption {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Sort a fetched collection by display name.
pub fn sort_by_name(options: &mut [GeoOption]) {
    options.sort_by(|a, b| a.name.cmp(&b.name));
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("Geography request failed: {0}")]
    Http(String),

    #[error("Geography API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid geography response: {0}")]
    InvalidResponse(String),

    #[error("Geography API key is not configured")]
    MissingApiKey,
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeoError::InvalidResponse(err.to_string())
        } else {
            GeoError::Http(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;

/// Read-only source of country, state and city lists.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn list_countries(&self) -> Result<Vec<GeoOption>>;

    async fn list_states(&self, country: &str) -> Result<Vec<GeoOption>>;

    async fn list_cities(&self, country: &str, state: &str) -> Result<Vec<GeoOption>>;
}
