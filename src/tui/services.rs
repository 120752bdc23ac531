use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::geo::{self, GeoClient, GeoProvider, GeoRequest};
use crate::core::submission::{
    ProfileApiClient, SubmissionPayload, SubmissionSink, UsernameAvailability,
};

use super::events::AppEvent;

/// Centralized handle to the remote collaborators.
///
/// Created once at startup. Every call runs on a spawned task and reports
/// back through `event_tx`, so the event loop never blocks on the network.
#[derive(Clone)]
pub struct Services {
    pub geo: Arc<dyn GeoProvider>,
    pub submission: Arc<dyn SubmissionSink>,
    pub usernames: Arc<dyn UsernameAvailability>,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    /// Build the HTTP clients from config.
    pub fn init(
        config: &AppConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let geo = GeoClient::from_config(&config.geo)?;
        log::info!("Geography client targeting {}", geo.base_url());
        if config.geo.api_key.is_none() {
            log::warn!("No geography API key configured; location lists will be empty");
        }

        let api = Arc::new(ProfileApiClient::from_config(&config.api)?);
        log::info!("Profile API client targeting {}", api.base_url());

        Ok(Self::with_providers(Arc::new(geo), api.clone(), api, event_tx))
    }

    pub fn with_providers(
        geo: Arc<dyn GeoProvider>,
        submission: Arc<dyn SubmissionSink>,
        usernames: Arc<dyn UsernameAvailability>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            geo,
            submission,
            usernames,
            event_tx,
        }
    }

    /// Run cascade fetches; each result arrives as [`AppEvent::GeoLoaded`].
    pub fn spawn_geo(&self, requests: impl IntoIterator<Item = GeoRequest>) {
        for request in requests {
            let provider = self.geo.clone();
            let tx = self.event_tx.clone();
            tokio::spawn(async move {
                let response = geo::fetch(provider.as_ref(), request).await;
                let _ = tx.send(AppEvent::GeoLoaded(response));
            });
        }
    }

    /// Send the profile; the outcome arrives as [`AppEvent::SubmitFinished`].
    pub fn spawn_submit(&self, payload: SubmissionPayload) {
        let sink = self.submission.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = sink.submit(payload).await;
            let _ = tx.send(AppEvent::SubmitFinished(result));
        });
    }

    /// Probe username availability; reported as [`AppEvent::UsernameChecked`].
    pub fn spawn_username_check(&self, username: String) {
        let usernames = self.usernames.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = usernames.check_username(&username).await;
            let _ = tx.send(AppEvent::UsernameChecked { username, result });
        });
    }
}
