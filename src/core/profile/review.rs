//! Read-only review projection of the accumulated draft.

use serde::Serialize;

use super::types::{Plan, Profession, WizardState, WizardStep};

/// Human-readable summary shown on the Review step.
///
/// Passwords never appear here; only whether one is being changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub photo_preview: Option<String>,
    pub photo_name: Option<String>,
    pub username: String,
    pub password_changed: bool,
    pub profession: Option<Profession>,
    /// Present only for entrepreneurs.
    pub company_name: Option<String>,
    pub address1: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub plan: Plan,
    pub newsletter: bool,
}

/// One titled group of label/value rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    pub title: &'static str,
    pub rows: Vec<(&'static str, String)>,
}

impl From<&WizardState> for ReviewSummary {
    fn from(state: &WizardState) -> Self {
        let company_name = state
            .profession
            .filter(|p| p.requires_company())
            .and(state.company_name.clone());

        Self {
            photo_preview: state.photo_preview.clone(),
            photo_name: state.photo.as_ref().map(|p| p.file_name.clone()),
            username: state.username.clone(),
            password_changed: state.wants_password_change(),
            profession: state.profession,
            company_name,
            address1: state.address1.clone(),
            country: state.location.country().to_string(),
            state: state.location.state().to_string(),
            city: state.location.city().to_string(),
            plan: state.plan(),
            newsletter: state.newsletter(),
        }
    }
}

impl ReviewSummary {
    pub fn sections(&self) -> Vec<ReviewSection> {
        let mut personal = Vec::new();
        if let Some(name) = &self.photo_name {
            personal.push(("Photo", name.clone()));
        }
        personal.push(("Username", self.username.clone()));
        if self.password_changed {
            personal.push(("Password", "(changed)".to_string()));
        }

        let mut professional = vec![(
            "Profession",
            self.profession.map(|p| p.to_string()).unwrap_or_default(),
        )];
        if let Some(company) = &self.company_name {
            professional.push(("Company Name", company.clone()));
        }
        professional.push(("Address Line 1", self.address1.clone()));

        let preferences = vec![
            ("Country", self.country.clone()),
            ("State", self.state.clone()),
            ("City", self.city.clone()),
            ("Subscription Plan", self.plan.to_string()),
            ("Newsletter", if self.newsletter { "Yes" } else { "No" }.to_string()),
        ];

        vec![
            ReviewSection {
                title: WizardStep::Personal.title(),
                rows: personal,
            },
            ReviewSection {
                title: WizardStep::Professional.title(),
                rows: professional,
            },
            ReviewSection {
                title: WizardStep::Preferences.title(),
                rows: preferences,
            },
        ]
    }

    /// All rows, flattened in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        self.sections().into_iter().flat_map(|s| s.rows).collect()
    }
}
