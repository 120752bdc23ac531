//! Wizard Domain Types
//!
//! Defines the core domain types for the profile creation wizard:
//! - [`WizardState`]: Accumulating draft shared by every step
//! - [`StepData`]: Per-step validated data merged into the draft on advance
//! - [`WizardStep`]: The four steps and their ordering
//! - [`FieldErrors`]: Field-level validation messages
//! - [`WizardError`]: Error types for controller transitions
//!
//! # Architecture
//!
//! The wizard uses a state machine pattern where each step collects specific
//! data and transitions forward or backward through the flow. The
//! [`WizardState`] is replaced by a merged copy every time a step advances,
//! and a step only ever supplies its own keys.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::validators::{validate_photo, PhotoError};

// ============================================================================
// Steps
// ============================================================================

/// The four wizard steps, in order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Photo, username and password change
    #[default]
    Personal,
    /// Profession, company and address
    Professional,
    /// Location cascade, plan and newsletter
    Preferences,
    /// Read-only summary and submission
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Personal,
        WizardStep::Professional,
        WizardStep::Preferences,
        WizardStep::Review,
    ];

    /// 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Personal => 1,
            WizardStep::Professional => 2,
            WizardStep::Preferences => 3,
            WizardStep::Review => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        WizardStep::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Personal => "Personal Info",
            WizardStep::Professional => "Professional Details",
            WizardStep::Preferences => "Preferences",
            WizardStep::Review => "Review & Submit",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Personal => "personal",
            WizardStep::Professional => "professional",
            WizardStep::Preferences => "preferences",
            WizardStep::Review => "review",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Enumerated choices
// ============================================================================

/// Profession choice for the Professional step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    Student,
    Developer,
    Entrepreneur,
}

impl Profession {
    pub const ALL: [Profession; 3] = [
        Profession::Student,
        Profession::Developer,
        Profession::Entrepreneur,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Profession::Student => "Student",
            Profession::Developer => "Developer",
            Profession::Entrepreneur => "Entrepreneur",
        }
    }

    /// Whether this profession carries a company name.
    pub fn requires_company(self) -> bool {
        self == Profession::Entrepreneur
    }
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profession {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profession::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownChoice(s.to_string()))
    }
}

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    Basic,
    Pro,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Basic, Plan::Pro, Plan::Enterprise];

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Basic => "Basic",
            Plan::Pro => "Pro",
            Plan::Enterprise => "Enterprise",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plan::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownChoice(s.to_string()))
    }
}

/// A string that names no known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown choice: {0}")]
pub struct UnknownChoice(pub String);

// ============================================================================
// Photo
// ============================================================================

/// Accepted photo content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoMime {
    Jpeg,
    Png,
}

impl PhotoMime {
    pub fn mime_type(self) -> &'static str {
        match self {
            PhotoMime::Jpeg => "image/jpeg",
            PhotoMime::Png => "image/png",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(PhotoMime::Jpeg),
            "image/png" => Some(PhotoMime::Png),
            _ => None,
        }
    }

    /// Sniff the content type from the file signature.
    ///
    /// Returns the MIME string of whatever was detected so that unsupported
    /// formats can still be reported by name.
    pub fn sniff(bytes: &[u8]) -> &'static str {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(image::ImageFormat::Png) => "image/png",
            Ok(other) => other.to_mime_type(),
            Err(_) => "application/octet-stream",
        }
    }
}

/// A validated profile photo held in memory until submission.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub file_name: String,
    pub mime: PhotoMime,
    pub bytes: Bytes,
}

impl Photo {
    /// Validate raw file content and wrap it as a photo.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, PhotoError> {
        let bytes = bytes.into();
        let mime = validate_photo(PhotoMime::sniff(&bytes), bytes.len())?;
        Ok(Self {
            file_name: file_name.into(),
            mime,
            bytes,
        })
    }

    /// Read and validate a photo from disk.
    pub fn load(path: &Path) -> Result<Self, PhotoError> {
        let bytes = std::fs::read(path).map_err(|e| PhotoError::Io(e.to_string()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        Self::from_bytes(file_name, bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// Location selection (cascade)
// ============================================================================

/// Country → state → city selection.
///
/// Setters clear every descendant, so a child is never set while its parent
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationSelection {
    country: String,
    state: String,
    city: String,
}

impl LocationSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection, dropping children whose parent is empty.
    pub fn from_parts(country: &str, state: &str, city: &str) -> Self {
        let mut selection = Self::new();
        selection.set_country(country);
        selection.set_state(state);
        selection.set_city(city);
        selection
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Select a country; clears state and city.
    pub fn set_country(&mut self, country: &str) {
        self.country = country.to_string();
        self.state.clear();
        self.city.clear();
    }

    /// Select a state; clears city. Ignored while no country is selected.
    pub fn set_state(&mut self, state: &str) {
        self.city.clear();
        if self.country.is_empty() {
            self.state.clear();
            return;
        }
        self.state = state.to_string();
    }

    /// Select a city. Ignored while no state is selected.
    pub fn set_city(&mut self, city: &str) {
        if self.state.is_empty() {
            self.city.clear();
            return;
        }
        self.city = city.to_string();
    }

    pub fn is_complete(&self) -> bool {
        !self.country.is_empty() && !self.state.is_empty() && !self.city.is_empty()
    }
}

// ============================================================================
// WizardState - Accumulated draft
// ============================================================================

/// Accumulated profile draft.
///
/// Text fields are empty until their step supplies them; `plan` and
/// `newsletter` are `None` until the Preferences step has been completed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardState {
    // Personal step
    pub photo: Option<Photo>,
    /// Display-only; never sent to the backend.
    pub photo_preview: Option<String>,
    pub username: String,
    pub current_password: String,
    pub new_password: String,

    // Professional step
    pub profession: Option<Profession>,
    pub company_name: Option<String>,
    pub address1: String,

    // Preferences step
    pub location: LocationSelection,
    pub plan: Option<Plan>,
    pub newsletter: Option<bool>,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan, defaulting to Basic until chosen.
    pub fn plan(&self) -> Plan {
        self.plan.unwrap_or_default()
    }

    /// Newsletter opt-in, defaulting to true until chosen.
    pub fn newsletter(&self) -> bool {
        self.newsletter.unwrap_or(true)
    }

    pub fn wants_password_change(&self) -> bool {
        !self.new_password.is_empty()
    }

    /// Return a copy with one step's data merged in. Keys owned by other
    /// steps are left untouched.
    pub fn merged(&self, data: StepData) -> Self {
        let mut next = self.clone();
        match data {
            StepData::Personal(personal) => {
                next.photo = personal.photo;
                next.photo_preview = personal.photo_preview;
                next.username = personal.username;
                next.current_password = personal.current_password;
                next.new_password = personal.new_password;
            }
            StepData::Professional(professional) => {
                next.company_name = if professional.profession.requires_company() {
                    professional.company_name
                } else {
                    None
                };
                next.profession = Some(professional.profession);
                next.address1 = professional.address1;
            }
            StepData::Preferences(preferences) => {
                next.location = preferences.location;
                next.plan = Some(preferences.plan);
                next.newsletter = Some(preferences.newsletter);
            }
        }
        next
    }
}

// ============================================================================
// StepData - Per-Step Input
// ============================================================================

/// Validated data produced by a step form on advance.
#[derive(Debug, Clone, PartialEq)]
pub enum StepData {
    Personal(PersonalData),
    Professional(ProfessionalData),
    Preferences(PreferencesData),
}

impl StepData {
    /// Get the wizard step this data corresponds to
    pub fn step(&self) -> WizardStep {
        match self {
            StepData::Personal(_) => WizardStep::Personal,
            StepData::Professional(_) => WizardStep::Professional,
            StepData::Preferences(_) => WizardStep::Preferences,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonalData {
    pub photo: Option<Photo>,
    pub photo_preview: Option<String>,
    pub username: String,
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionalData {
    pub profession: Profession,
    pub company_name: Option<String>,
    pub address1: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferencesData {
    pub location: LocationSelection,
    pub plan: Plan,
    pub newsletter: bool,
}

// ============================================================================
// Field errors
// ============================================================================

/// Every input the step forms own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Photo,
    Username,
    CurrentPassword,
    NewPassword,
    Profession,
    CompanyName,
    Address1,
    Country,
    State,
    City,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Photo => "Profile Photo",
            Field::Username => "Username",
            Field::CurrentPassword => "Current Password",
            Field::NewPassword => "New Password",
            Field::Profession => "Profession",
            Field::CompanyName => "Company Name",
            Field::Address1 => "Address Line 1",
            Field::Country => "Country",
            Field::State => "State",
            Field::City => "City",
        }
    }
}

/// Field → message map. Empty means valid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Keep only the listed fields.
    pub fn retain(&mut self, mut keep: impl FnMut(Field) -> bool) {
        self.0.retain(|field, _| keep(*field));
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.label(), message)?;
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during wizard transitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("Invalid step transition: cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Profile already submitted")]
    AlreadySubmitted,

    #[error("A submission is already in flight")]
    SubmitInFlight,

    #[error("{0}")]
    Submission(String),
}

// ============================================================================
// Tests
// ============================================================================
