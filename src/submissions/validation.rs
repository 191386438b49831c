//! Field validation for quote and subscription forms.
//!
//! Inputs are expected to be sanitized already. Checks run in a fixed order
//! and stop at the first failure.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::submissions::types::QuoteForm;

/// Maximum email length in bytes.
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Maximum local-part length (RFC 5321).
const MAX_LOCAL_PART_LENGTH: usize = 64;

/// Email validation regex (simplified RFC 5322).
/// The pattern is a constant, so the `expect()` only fires on a programming error.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("EMAIL_REGEX is a valid regex pattern")
});

/// A rejected form. Display text is the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name and email are required.")]
    NameAndEmailRequired,

    #[error("Email is required.")]
    EmailRequired,

    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("Email address is too long.")]
    EmailTooLong,
}

impl ValidationError {
    /// Static user-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NameAndEmailRequired => "Name and email are required.",
            Self::EmailRequired => "Email is required.",
            Self::InvalidEmail => "Invalid email address.",
            Self::EmailTooLong => "Email address is too long.",
        }
    }
}

/// Syntax check for an email address.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, _domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.len() > MAX_LOCAL_PART_LENGTH || local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    EMAIL_REGEX.is_match(email)
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    Ok(())
}

/// Validate a sanitized quote form.
pub fn validate_quote(form: &QuoteForm) -> Result<(), ValidationError> {
    if form.name.is_empty() || form.email.is_empty() {
        return Err(ValidationError::NameAndEmailRequired);
    }
    check_email(&form.email)
}

/// Validate a sanitized subscription email. The duplicate check happens
/// against the store, not here.
pub fn validate_subscription(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    check_email(email)
}
