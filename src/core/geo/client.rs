//! HTTP geography client
//!
//! Talks to a countrystatecity-style REST API:
//! - `GET /countries`
//! - `GET /countries/{country}/states`
//! - `GET /countries/{country}/states/{state}/cities`
//!
//! The API key is injected from configuration and sent as `X-CSCAPI-KEY`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::types::{sort_by_name, GeoError, GeoOption, GeoProvider, Result};
use crate::config::GeoConfig;

const API_KEY_HEADER: &str = "X-CSCAPI-KEY";

/// Region record as returned by the API. Countries and states carry `iso2`,
/// cities only a numeric `id`.
#[derive(Debug, Deserialize)]
struct RegionRecord {
    #[serde(default)]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    iso2: Option<String>,
}

impl RegionRecord {
    fn into_coded(self) -> Option<GeoOption> {
        let code = self.iso2.or_else(|| self.id.map(|id| id.to_string()))?;
        Some(GeoOption::new(code, self.name))
    }

    fn into_city(self) -> Option<GeoOption> {
        let code = self
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| self.name.clone());
        Some(GeoOption::new(code, self.name))
    }
}

pub struct GeoClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl GeoClient {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
            client,
        })
    }

    pub fn from_config(config: &GeoConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL with path segments appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GeoError::Http(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| GeoError::Http(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch(&self, segments: &[&str]) -> Result<Vec<RegionRecord>> {
        let api_key = self.api_key.as_deref().ok_or(GeoError::MissingApiKey)?;
        let url = self.endpoint(segments)?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeoError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GeoProvider for GeoClient {
    async fn list_countries(&self) -> Result<Vec<GeoOption>> {
        let mut options: Vec<GeoOption> = self
            .fetch(&["countries"])
            .await?
            .into_iter()
            .filter_map(RegionRecord::into_coded)
            .collect();
        sort_by_name(&mut options);
        tracing::debug!(count = options.len(), "Fetched countries");
        Ok(options)
    }

    async fn list_states(&self, country: &str) -> Result<Vec<GeoOption>> {
        let mut options: Vec<GeoOption> = self
            .fetch(&["countries", country, "states"])
            .await?
            .into_iter()
            .filter_map(RegionRecord::into_coded)
            .collect();
        sort_by_name(&mut options);
        tracing::debug!(country, count = options.len(), "Fetched states");
        Ok(options)
    }

    async fn list_cities(&self, country: &str, state: &str) -> Result<Vec<GeoOption>> {
        let mut options: Vec<GeoOption> = self
            .fetch(&["countries", country, "states", state, "cities"])
            .await?
            .into_iter()
            .filter_map(RegionRecord::into_city)
            .collect();
        sort_by_name(&mut options);
        tracing::debug!(country, state, count = options.len(), "Fetched cities");
        Ok(options)
    }
}
