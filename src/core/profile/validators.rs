//! Field Validators
//!
//! Pure, deterministic checks over raw field input. Every function returns
//! the message to show beside the field, or nothing when the value is valid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Field, FieldErrors, LocationSelection, PhotoMime, Profession};

/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const USERNAME_MIN_CHARS: usize = 4;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 8;

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const USERNAME_LENGTH: &str = "Username must be 4-20 characters";
pub const USERNAME_SPACES: &str = "No spaces allowed";
pub const PASSWORD_TOO_SHORT: &str = "At least 8 characters";
pub const PASSWORD_NEEDS_SPECIAL: &str = "At least 1 special character";
pub const PASSWORD_NEEDS_DIGIT: &str = "At least 1 number";
pub const CURRENT_PASSWORD_REQUIRED: &str = "Current password required to change password";
pub const PROFESSION_REQUIRED: &str = "Profession is required";
pub const COMPANY_REQUIRED: &str = "Company Name is required";
pub const ADDRESS_REQUIRED: &str = "Address Line 1 is required";
pub const COUNTRY_REQUIRED: &str = "Country is required";
pub const STATE_REQUIRED: &str = "State is required";
pub const CITY_REQUIRED: &str = "City is required";

// ============================================================================
// Photo
// ============================================================================

/// Reasons a selected photo is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    #[error("Only JPG/PNG allowed")]
    UnsupportedType(String),

    #[error("File must be <= 2MB")]
    TooLarge(usize),

    #[error("Could not read photo: {0}")]
    Io(String),
}

/// Accept JPEG or PNG up to [`MAX_PHOTO_BYTES`]. Type is checked before size.
pub fn validate_photo(mime: &str, size: usize) -> Result<PhotoMime, PhotoError> {
    let accepted =
        PhotoMime::from_mime(mime).ok_or_else(|| PhotoError::UnsupportedType(mime.to_string()))?;
    if size > MAX_PHOTO_BYTES {
        return Err(PhotoError::TooLarge(size));
    }
    Ok(accepted)
}

// ============================================================================
// Username
// ============================================================================

pub fn validate_username(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some(USERNAME_REQUIRED);
    }
    let len = value.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Some(USERNAME_LENGTH);
    }
    if value.chars().any(char::is_whitespace) {
        return Some(USERNAME_SPACES);
    }
    None
}

// ============================================================================
// Passwords
// ============================================================================

/// Strength meter shown beside a non-empty new password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    pub fn label(self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Weak",
            PasswordStrength::Medium => "Medium",
            PasswordStrength::Strong => "Strong",
        }
    }
}

/// Outcome of checking a new password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCheck {
    pub error: Option<&'static str>,
    /// `None` for an empty password.
    pub strength: Option<PasswordStrength>,
}

impl PasswordCheck {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

fn has_special(value: &str) -> bool {
    value.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
}

fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

/// Empty means "no change requested" and is valid.
pub fn validate_new_password(value: &str) -> PasswordCheck {
    if value.is_empty() {
        return PasswordCheck {
            error: None,
            strength: None,
        };
    }

    let long_enough = value.chars().count() >= PASSWORD_MIN_CHARS;
    let special = has_special(value);
    let digit = has_digit(value);

    let error = if !long_enough {
        Some(PASSWORD_TOO_SHORT)
    } else if !special {
        Some(PASSWORD_NEEDS_SPECIAL)
    } else if !digit {
        Some(PASSWORD_NEEDS_DIGIT)
    } else {
        None
    };

    let strength = if long_enough && special && digit {
        PasswordStrength::Strong
    } else if long_enough {
        PasswordStrength::Medium
    } else {
        PasswordStrength::Weak
    };

    PasswordCheck {
        error,
        strength: Some(strength),
    }
}

/// The current password is required exactly when a new one is set.
pub fn validate_current_password(current: &str, new_password: &str) -> Option<&'static str> {
    (!new_password.is_empty() && current.is_empty()).then_some(CURRENT_PASSWORD_REQUIRED)
}

// ============================================================================
// Step-level validation
// ============================================================================

pub fn validate_step1(username: &str, current_password: &str, new_password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(message) = validate_username(username) {
        errors.insert(Field::Username, message);
    }
    if let Some(message) = validate_current_password(current_password, new_password) {
        errors.insert(Field::CurrentPassword, message);
    }
    if let Some(message) = validate_new_password(new_password).error {
        errors.insert(Field::NewPassword, message);
    }
    errors
}

/// Reports every violated rule, not just the first.
pub fn validate_step2(
    profession: Option<Profession>,
    company_name: &str,
    address1: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match profession {
        None => errors.insert(Field::Profession, PROFESSION_REQUIRED),
        Some(p) if p.requires_company() && company_name.is_empty() => {
            errors.insert(Field::CompanyName, COMPANY_REQUIRED)
        }
        Some(_) => {}
    }
    if address1.is_empty() {
        errors.insert(Field::Address1, ADDRESS_REQUIRED);
    }
    errors
}

pub fn validate_step3(country: &str, state: &str, city: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if country.is_empty() {
        errors.insert(Field::Country, COUNTRY_REQUIRED);
    }
    if state.is_empty() {
        errors.insert(Field::State, STATE_REQUIRED);
    }
    if city.is_empty() {
        errors.insert(Field::City, CITY_REQUIRED);
    }
    errors
}

/// [`validate_step3`] over a cascade selection.
pub fn validate_location(location: &LocationSelection) -> FieldErrors {
    validate_step3(location.country(), location.state(), location.city())
}
