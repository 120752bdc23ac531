//! Wire payload for `POST /submit-profile`.

use serde::{Deserialize, Serialize};

use crate::core::profile::{Photo, Plan, Profession, WizardState};

/// Text fields of a profile submission, camelCase on the wire.
///
/// Empty passwords and a company name for non-entrepreneurs are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<Profession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub address1: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub plan: Plan,
    pub newsletter: bool,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&WizardState> for ProfileFields {
    fn from(state: &WizardState) -> Self {
        let company_name = state
            .profession
            .filter(|p| p.requires_company())
            .and(state.company_name.clone());

        Self {
            username: state.username.clone(),
            current_password: non_empty(&state.current_password),
            new_password: non_empty(&state.new_password),
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

impl ProfileFields {
    /// Every present field as a multipart text part, in wire order.
    pub fn text_parts(&self) -> Vec<(&'static str, String)> {
        let mut parts = vec![("username", self.username.clone())];
        if let Some(v) = &self.current_password {
            parts.push(("currentPassword", v.clone()));
        }
        if let Some(v) = &self.new_password {
            parts.push(("newPassword", v.clone()));
        }
        if let Some(p) = self.profession {
            parts.push(("profession", p.to_string()));
        }
        if let Some(v) = &self.company_name {
            parts.push(("companyName", v.clone()));
        }
        parts.extend([
            ("address1", self.address1.clone()),
            ("country", self.country.clone()),
            ("state", self.state.clone()),
            ("city", self.city.clone()),
            ("plan", self.plan.to_string()),
            ("newsletter", self.newsletter.to_string()),
        ]);
        parts
    }
}

/// A finalized draft ready for the submission sink. The preview URI is
/// dropped here and never leaves the client.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    pub fields: ProfileFields,
    pub photo: Option<Photo>,
}

impl SubmissionPayload {
    pub fn from_state(state: &WizardState) -> Self {
        Self {
            fields: ProfileFields::from(state),
            photo: state.photo.clone(),
        }
    }

    /// A photo forces a multipart body; otherwise plain JSON.
    pub fn is_multipart(&self) -> bool {
        self.photo.is_some()
    }
}
