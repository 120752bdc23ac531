//! Step Forms
//!
//! Each form owns the local values of one step plus the set of fields the
//! user has touched. Errors always exist once a value is invalid; the touched
//! set only decides whether they are shown.
//!
//! On an advance attempt a form validates everything it owns. Failure marks
//! all of its fields as touched and yields the errors; success yields the
//! [`StepData`] to merge into the [`WizardState`].

use std::collections::BTreeSet;
use std::path::Path;

use url::Url;

use super::types::{
    Field, FieldErrors, LocationSelection, PersonalData, Photo, Plan, PreferencesData,
    ProfessionalData, Profession, StepData, WizardState, WizardStep,
};
use super::validators::{
    validate_location, validate_new_password, validate_step1, validate_step2, PasswordStrength,
    PhotoError,
};
use crate::core::geo::{GeoCascade, GeoLevel, GeoOption, GeoRequest, GeoResponse, LevelState};

/// Fields the user has interacted with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchedFields(BTreeSet<Field>);

impl TouchedFields {
    pub fn touch(&mut self, field: Field) {
        self.0.insert(field);
    }

    pub fn touch_all(&mut self, fields: &[Field]) {
        self.0.extend(fields.iter().copied());
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shared contract of the three input steps.
pub trait StepForm {
    /// Fields owned by this step.
    const FIELDS: &'static [Field];

    fn step(&self) -> WizardStep;

    /// Every current validation error, touched or not.
    fn errors(&self) -> FieldErrors;

    fn touched(&self) -> &TouchedFields;

    fn touched_mut(&mut self) -> &mut TouchedFields;

    /// Snapshot the validated values. Only called once `errors()` is empty.
    fn collect(&self) -> StepData;

    fn touch(&mut self, field: Field) {
        self.touched_mut().touch(field);
    }

    /// Errors to display: only those on touched fields.
    fn visible_errors(&self) -> FieldErrors {
        let mut errors = self.errors();
        let touched = self.touched().clone();
        errors.retain(|field| touched.contains(field));
        errors
    }

    fn try_advance(&mut self) -> Result<StepData, FieldErrors> {
        let errors = self.errors();
        if !errors.is_empty() {
            self.touched_mut().touch_all(Self::FIELDS);
            tracing::debug!(step = %self.step(), errors = %errors, "Step validation failed");
            return Err(errors);
        }
        Ok(self.collect())
    }
}

// ============================================================================
// Step 1: Personal
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PersonalForm {
    pub photo: Option<Photo>,
    pub photo_preview: Option<String>,
    pub username: String,
    pub current_password: String,
    pub new_password: String,
    /// Last upload rejection, shown until the next selection.
    pub photo_error: Option<String>,
    touched: TouchedFields,
}

impl PersonalForm {
    pub fn from_state(state: &WizardState) -> Self {
        Self {
            photo: state.photo.clone(),
            photo_preview: state.photo_preview.clone(),
            username: state.username.clone(),
            current_password: state.current_password.clone(),
            new_password: state.new_password.clone(),
            photo_error: None,
            touched: TouchedFields::default(),
        }
    }

    /// Apply the outcome of choosing a photo. A rejection discards any
    /// previously chosen photo and its preview.
    pub fn select_photo(&mut self, selected: Result<Photo, PhotoError>, source: Option<&Path>) {
        match selected {
            Ok(photo) => {
                self.photo_preview = Some(preview_uri(&photo, source));
                tracing::debug!(file = %photo.file_name, size = photo.size(), "Photo selected");
                self.photo = Some(photo);
                self.photo_error = None;
            }
            Err(e) => {
                tracing::info!(error = %e, "Photo rejected");
                self.photo = None;
                self.photo_preview = None;
                self.photo_error = Some(e.to_string());
            }
        }
    }

    /// Read a photo from disk and select it.
    pub fn select_photo_path(&mut self, path: &Path) {
        self.select_photo(Photo::load(path), Some(path));
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
        self.photo_preview = None;
        self.photo_error = None;
    }

    pub fn set_username(&mut self, value: &str) {
        self.username = value.to_string();
    }

    pub fn set_current_password(&mut self, value: &str) {
        self.current_password = value.to_string();
    }

    pub fn set_new_password(&mut self, value: &str) {
        self.new_password = value.to_string();
    }

    /// Strength meter for the new password; `None` while it is empty.
    pub fn password_strength(&self) -> Option<PasswordStrength> {
        validate_new_password(&self.new_password).strength
    }
}

/// Local display reference for a selected photo.
fn preview_uri(photo: &Photo, source: Option<&Path>) -> String {
    source
        .and_then(|path| std::fs::canonicalize(path).ok())
        .and_then(|path| Url::from_file_path(path).ok())
        .map(String::from)
        .unwrap_or_else(|| format!("memory:{}", photo.file_name))
}

impl StepForm for PersonalForm {
    const FIELDS: &'static [Field] = &[Field::Username, Field::CurrentPassword, Field::NewPassword];

    fn step(&self) -> WizardStep {
        WizardStep::Personal
    }

    fn errors(&self) -> FieldErrors {
        validate_step1(&self.username, &self.current_password, &self.new_password)
    }

    fn touched(&self) -> &TouchedFields {
        &self.touched
    }

    fn touched_mut(&mut self) -> &mut TouchedFields {
        &mut self.touched
    }

    fn collect(&self) -> StepData {
        StepData::Personal(PersonalData {
            photo: self.photo.clone(),
            photo_preview: self.photo_preview.clone(),
            username: self.username.clone(),
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}

// ============================================================================
// Step 2: Professional
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ProfessionalForm {
    pub profession: Option<Profession>,
    pub company_name: String,
    pub address1: String,
    touched: TouchedFields,
}

impl ProfessionalForm {
    pub fn from_state(state: &WizardState) -> Self {
        Self {
            profession: state.profession,
            company_name: state.company_name.clone().unwrap_or_default(),
            address1: state.address1.clone(),
            touched: TouchedFields::default(),
        }
    }

    /// Choosing anything but Entrepreneur clears the company name.
    pub fn set_profession(&mut self, profession: Option<Profession>) {
        self.profession = profession;
        self.touched.touch(Field::Profession);
        if !profession.is_some_and(Profession::requires_company) {
            self.company_name.clear();
        }
    }

    /// Whether the company name input is shown at all.
    pub fn shows_company(&self) -> bool {
        self.profession.is_some_and(Profession::requires_company)
    }

    pub fn set_company_name(&mut self, value: &str) {
        self.company_name = value.to_string();
    }

    pub fn set_address1(&mut self, value: &str) {
        self.address1 = value.to_string();
    }
}

impl StepForm for ProfessionalForm {
    const FIELDS: &'static [Field] = &[Field::Profession, Field::CompanyName, Field::Address1];

    fn step(&self) -> WizardStep {
        WizardStep::Professional
    }

    fn errors(&self) -> FieldErrors {
        validate_step2(self.profession, &self.company_name, &self.address1)
    }

    fn touched(&self) -> &TouchedFields {
        &self.touched
    }

    fn touched_mut(&mut self) -> &mut TouchedFields {
        &mut self.touched
    }

    fn collect(&self) -> StepData {
        // errors() guarantees a profession by now; Student is never reached
        let profession = self.profession.unwrap_or(Profession::Student);
        StepData::Professional(ProfessionalData {
            profession,
            company_name: profession
                .requires_company()
                .then(|| self.company_name.clone()),
            address1: self.address1.clone(),
        })
    }
}

// ============================================================================
// Step 3: Preferences
// ============================================================================

#[derive(Debug, Clone)]
pub struct PreferencesForm {
    pub location: LocationSelection,
    pub plan: Plan,
    pub newsletter: bool,
    geo: GeoCascade,
    touched: TouchedFields,
}

impl Default for PreferencesForm {
    fn default() -> Self {
        Self::from_state(&WizardState::default())
    }
}

impl PreferencesForm {
    pub fn from_state(state: &WizardState) -> Self {
        Self {
            location: state.location.clone(),
            plan: state.plan(),
            newsletter: state.newsletter(),
            geo: GeoCascade::new(),
            touched: TouchedFields::default(),
        }
    }

    /// Fetches needed when the step is shown.
    pub fn open(&mut self) -> Vec<GeoRequest> {
        self.geo.open(&self.location)
    }

    pub fn geo(&self) -> &GeoCascade {
        &self.geo
    }

    pub fn level(&self, level: GeoLevel) -> &LevelState {
        self.geo.level(level)
    }

    /// Select a country code (empty clears). Returns the states fetch to run.
    pub fn set_country(&mut self, code: &str) -> Option<GeoRequest> {
        self.location.set_country(code);
        self.touched.touch(Field::Country);
        self.geo.country_changed(&self.location)
    }

    /// Select a state code (empty clears). Returns the cities fetch to run.
    pub fn set_state(&mut self, code: &str) -> Option<GeoRequest> {
        self.location.set_state(code);
        self.touched.touch(Field::State);
        self.geo.state_changed(&self.location)
    }

    /// Select a city by name.
    pub fn set_city(&mut self, name: &str) {
        self.location.set_city(name);
        self.touched.touch(Field::City);
    }

    pub fn select_country_option(&mut self, option: &GeoOption) -> Option<GeoRequest> {
        self.set_country(&option.code)
    }

    pub fn select_state_option(&mut self, option: &GeoOption) -> Option<GeoRequest> {
        self.set_state(&option.code)
    }

    /// Cities are stored by name.
    pub fn select_city_option(&mut self, option: &GeoOption) {
        self.set_city(&option.name)
    }

    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
    }

    pub fn set_newsletter(&mut self, newsletter: bool) {
        self.newsletter = newsletter;
    }

    /// Feed a finished fetch back in. Returns false if it was stale.
    pub fn apply_geo(&mut self, response: GeoResponse) -> bool {
        self.geo.apply(response)
    }
}

impl StepForm for PreferencesForm {
    const FIELDS: &'static [Field] = &[Field::Country, Field::State, Field::City];

    fn step(&self) -> WizardStep {
        WizardStep::Preferences
    }

    fn errors(&self) -> FieldErrors {
        validate_location(&self.location)
    }

    fn touched(&self) -> &TouchedFields {
        &self.touched
    }

    fn touched_mut(&mut self) -> &mut TouchedFields {
        &mut self.touched
    }

    fn collect(&self) -> StepData {
        StepData::Preferences(PreferencesData {
            location: self.location.clone(),
            plan: self.plan,
            newsletter: self.newsletter,
        })
    }
}

// ============================================================================
// Active form
// ============================================================================

/// The form rendered for the current step. Review has no local fields.
#[derive(Debug, Clone)]
pub enum ActiveForm {
    Personal(PersonalForm),
    Professional(ProfessionalForm),
    Preferences(PreferencesForm),
    Review,
}

impl ActiveForm {
    /// Build the form for `step`, pre-populated from the accumulated state.
    pub fn for_step(step: WizardStep, state: &WizardState) -> Self {
        match step {
            WizardStep::Personal => ActiveForm::Personal(PersonalForm::from_state(state)),
            WizardStep::Professional => {
                ActiveForm::Professional(ProfessionalForm::from_state(state))
            }
            WizardStep::Preferences => ActiveForm::Preferences(PreferencesForm::from_state(state)),
            WizardStep::Review => ActiveForm::Review,
        }
    }

    pub fn step(&self) -> WizardStep {
        match self {
            ActiveForm::Personal(_) => WizardStep::Personal,
            ActiveForm::Professional(_) => WizardStep::Professional,
            ActiveForm::Preferences(_) => WizardStep::Preferences,
            ActiveForm::Review => WizardStep::Review,
        }
    }

    /// Mark a field as interacted with.
    pub fn touch(&mut self, field: Field) {
        match self {
            ActiveForm::Personal(form) => form.touch(field),
            ActiveForm::Professional(form) => form.touch(field),
            ActiveForm::Preferences(form) => form.touch(field),
            ActiveForm::Review => {}
        }
    }

    pub fn visible_errors(&self) -> FieldErrors {
        match self {
            ActiveForm::Personal(form) => form.visible_errors(),
            ActiveForm::Professional(form) => form.visible_errors(),
            ActiveForm::Preferences(form) => form.visible_errors(),
            ActiveForm::Review => FieldErrors::new(),
        }
    }

    pub fn try_advance(&mut self) -> Result<StepData, FieldErrors> {
        match self {
            ActiveForm::Personal(form) => form.try_advance(),
            ActiveForm::Professional(form) => form.try_advance(),
            ActiveForm::Preferences(form) => form.try_advance(),
            ActiveForm::Review => Err(FieldErrors::new()),
        }
    }
}
