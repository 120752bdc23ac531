//! Geo Cascade Loader
//!
//! Tracks the three dependent option lists behind the Preferences step.
//!
//! # Dependency rules
//!
//! | Trigger                      | Fetch issued                     |
//! |------------------------------|----------------------------------|
//! | step first shown             | countries (once)                 |
//! | country changed, non-empty   | states of that country           |
//! | state changed, both set      | cities of that country/state     |
//!
//! Any change clears every descendant collection before the next fetch is
//! issued. Each fetch carries a ticket; a response is applied only while its
//! level is still waiting on that same ticket, so a slow response for an
//! earlier selection can never overwrite data for a newer one. Tickets are
//! unique per process, so a response addressed to a discarded cascade never
//! matches a fresh one.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::types::{sort_by_name, GeoOption, GeoProvider, Result};
use crate::core::profile::LocationSelection;

/// The three cascade levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    Country,
    State,
    City,
}

/// The dependency tuple a fetch was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeoKey {
    Countries,
    States { country: String },
    Cities { country: String, state: String },
}

impl GeoKey {
    pub fn level(&self) -> GeoLevel {
        match self {
            GeoKey::Countries => GeoLevel::Country,
            GeoKey::States { .. } => GeoLevel::State,
            GeoKey::Cities { .. } => GeoLevel::City,
        }
    }

    /// Derive the key for a level from the current selection. `None` when a
    /// required ancestor is empty.
    pub fn derive(level: GeoLevel, selection: &LocationSelection) -> Option<Self> {
        match level {
            GeoLevel::Country => Some(GeoKey::Countries),
            GeoLevel::State if !selection.country().is_empty() => Some(GeoKey::States {
                country: selection.country().to_string(),
            }),
            GeoLevel::City if !selection.country().is_empty() && !selection.state().is_empty() => {
                Some(GeoKey::Cities {
                    country: selection.country().to_string(),
                    state: selection.state().to_string(),
                })
            }
            _ => None,
        }
    }
}

/// A fetch the caller should run with [`fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRequest {
    pub ticket: u64,
    pub key: GeoKey,
}

impl GeoRequest {
    pub fn level(&self) -> GeoLevel {
        self.key.level()
    }
}

/// Result of running a [`GeoRequest`].
#[derive(Debug, Clone)]
pub struct GeoResponse {
    pub request: GeoRequest,
    pub result: Result<Vec<GeoOption>>,
}

/// Load state of one level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelState {
    #[default]
    NotRequested,
    Loading { ticket: u64 },
    Loaded(Vec<GeoOption>),
}

impl LevelState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LevelState::Loading { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LevelState::Loaded(_))
    }

    /// Options to offer; empty unless loaded.
    pub fn options(&self) -> &[GeoOption] {
        match self {
            LevelState::Loaded(options) => options,
            _ => &[],
        }
    }
}

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

fn next_ticket() -> u64 {
    NEXT_TICKET.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Default)]
pub struct GeoCascade {
    countries: LevelState,
    states: LevelState,
    cities: LevelState,
}

impl GeoCascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, level: GeoLevel) -> &LevelState {
        match level {
            GeoLevel::Country => &self.countries,
            GeoLevel::State => &self.states,
            GeoLevel::City => &self.cities,
        }
    }

    fn level_mut(&mut self, level: GeoLevel) -> &mut LevelState {
        match level {
            GeoLevel::Country => &mut self.countries,
            GeoLevel::State => &mut self.states,
            GeoLevel::City => &mut self.cities,
        }
    }

    pub fn countries(&self) -> &[GeoOption] {
        self.countries.options()
    }

    pub fn states(&self) -> &[GeoOption] {
        self.states.options()
    }

    pub fn cities(&self) -> &[GeoOption] {
        self.cities.options()
    }

    fn issue(&mut self, key: GeoKey) -> GeoRequest {
        let ticket = next_ticket();
        *self.level_mut(key.level()) = LevelState::Loading { ticket };
        tracing::debug!(ticket, ?key, "Issuing geo fetch");
        GeoRequest { ticket, key }
    }

    /// Step shown: fetch countries once, plus whatever the existing
    /// selection depends on (re-entering the step with a prior selection).
    pub fn open(&mut self, selection: &LocationSelection) -> Vec<GeoRequest> {
        let mut requests = Vec::new();
        if self.countries == LevelState::NotRequested {
            requests.push(self.issue(GeoKey::Countries));
        }
        for level in [GeoLevel::State, GeoLevel::City] {
            if *self.level(level) != LevelState::NotRequested {
                continue;
            }
            if let Some(key) = GeoKey::derive(level, selection) {
                requests.push(self.issue(key));
            }
        }
        requests
    }

    /// Country changed. Clears states and cities; fetches states when the
    /// new country is non-empty.
    pub fn country_changed(&mut self, selection: &LocationSelection) -> Option<GeoRequest> {
        self.states = LevelState::NotRequested;
        self.cities = LevelState::NotRequested;
        GeoKey::derive(GeoLevel::State, selection).map(|key| self.issue(key))
    }

    /// State changed. Clears cities; fetches cities when both ancestors are set.
    pub fn state_changed(&mut self, selection: &LocationSelection) -> Option<GeoRequest> {
        self.cities = LevelState::NotRequested;
        GeoKey::derive(GeoLevel::City, selection).map(|key| self.issue(key))
    }

    /// Apply a finished fetch. Returns false when the response is stale.
    ///
    /// Failures degrade to an empty collection for that level.
    pub fn apply(&mut self, response: GeoResponse) -> bool {
        let GeoResponse { request, result } = response;
        let level = request.level();
        let slot = self.level_mut(level);

        if *slot != (LevelState::Loading { ticket: request.ticket }) {
            tracing::debug!(ticket = request.ticket, ?level, "Discarding stale geo response");
            return false;
        }

        let options = match result {
            Ok(mut options) => {
                sort_by_name(&mut options);
                options
            }
            Err(e) => {
                tracing::warn!(key = ?request.key, error = %e, "Geo fetch failed, showing no options");
                Vec::new()
            }
        };
        *slot = LevelState::Loaded(options);
        true
    }
}

/// Run a request against a provider.
pub async fn fetch(provider: &dyn GeoProvider, request: GeoRequest) -> GeoResponse {
    let result = match &request.key {
        GeoKey::Countries => provider.list_countries().await,
        GeoKey::States { country } => provider.list_states(country).await,
        GeoKey::Cities { country, state } => provider.list_cities(country, state).await,
    };
    GeoResponse { request, result }
}
