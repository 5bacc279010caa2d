//! Input validation for registration intake.
//!
//! Every failing field is reported at once so the form can highlight all of
//! them in one round trip.

use crate::constants::INSTITUTION_EMAIL_DOMAIN;
use crate::error::{FieldError, PassError, Result};
use crate::registrant::Purpose;

/// Registration fields after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    /// Trimmed name.
    pub name: String,
    /// Trimmed roll number.
    pub roll_number: String,
    /// Trimmed, lowercased email.
    pub email: String,
    /// Parsed purpose.
    pub purpose: Purpose,
}

/// Validate raw registration fields.
///
/// # Errors
///
/// Returns [`PassError::Validation`] listing every failing field.
pub fn validate_registration(
    name: &str,
    roll_number: &str,
    email: &str,
    purpose: &str,
) -> Result<ValidRegistration> {
    let mut errors = Vec::new();

    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required."));
    }

    let roll_number = roll_number.trim();
    if roll_number.is_empty() {
        errors.push(FieldError::new("rollNumber", "Roll number is required."));
    }

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "A valid email is required."));
    } else if !is_institution_email(&email) {
        errors.push(FieldError::new(
            "email",
            format!("Email must end with {INSTITUTION_EMAIL_DOMAIN}"),
        ));
    }

    let parsed_purpose = if purpose.trim().is_empty() {
        errors.push(FieldError::new("purpose", "Purpose is required."));
        None
    } else {
        Purpose::parse(purpose)
            .map_err(|_| {
                errors.push(FieldError::new(
                    "purpose",
                    "Purpose must be one of Volunteer, Participant, Visitor.",
                ));
            })
            .ok()
    };

    match parsed_purpose {
        Some(purpose) if errors.is_empty() => Ok(ValidRegistration {
            name: name.to_string(),
            roll_number: roll_number.to_string(),
            email,
            purpose,
        }),
        _ => Err(PassError::Validation(errors)),
    }
}

/// Returns `true` if the address belongs to the institution's domain.
///
/// The domain must match exactly; subdomains do not qualify.
///
/// # Examples
///
/// ```
/// use gatepass_core::validation::is_institution_email;
///
/// assert!(is_institution_email("user@bitmesra.ac.in"));
/// assert!(is_institution_email("User@BITMESRA.AC.IN"));
/// assert!(!is_institution_email("user@gmail.com"));
/// assert!(!is_institution_email("user@mail.bitmesra.ac.in"));
/// ```
#[must_use]
pub fn is_institution_email(email: &str) -> bool {
    email
        .rsplit_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.eq_ignore_ascii_case(INSTITUTION_EMAIL_DOMAIN)
        })
}

/// Validate email address format.
///
/// Basic checks:
/// - Must contain exactly one `@`
/// - Must have non-empty local and domain parts
/// - Length must be between 3 and 255 characters
/// - No whitespace anywhere
///
/// # Examples
///
/// ```
/// use gatepass_core::validation::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain must contain at least one dot, with no empty labels
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return false;
    }

    let valid_local_chars = |c: char| {
        c.is_alphanumeric() || c == '.' || c == '-' || c == '+' || c == '_'
    };

    let valid_domain_chars = |c: char| c.is_alphanumeric() || c == '.' || c == '-';

    local.chars().all(valid_local_chars) && domain.chars().all(valid_domain_chars)
}
