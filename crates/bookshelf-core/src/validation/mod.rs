//! Input validation and normalization.
//!
//! All external fields pass through here before reaching the stores.
//! Checks are explicit and typed: a rating of 0 is rejected as out of
//! range rather than conflated with a missing field.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;
/// Valid rating range (inclusive).
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Validation error types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields are absent or empty.
    #[error("Please fill all fields")]
    MissingFields,

    /// Password shorter than the minimum.
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    /// Username shorter than the minimum.
    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    /// Email does not look like an address.
    #[error("Invalid email address")]
    InvalidEmail,

    /// Rating outside the 1-5 range.
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
}

/// Normalize an email address for storage and lookup.
///
/// Trimmed and lowercased so uniqueness checks are case-insensitive.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate an email address and return its normalized form.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` if the address has no
/// local part or domain.
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email(raw);
    match normalized.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && domain.contains('.') =>
        {
            Ok(normalized)
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// Validate a username and return its NFKC-normalized form.
///
/// # Errors
///
/// Returns `ValidationError::UsernameTooShort` if shorter than
/// [`MIN_USERNAME_LENGTH`] characters.
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    // NFKC prevents visually-identical usernames differing only in codepoints
    let normalized: String = raw.trim().nfkc().collect();
    if normalized.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(normalized)
}

/// Validate a password.
///
/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` if shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(raw: &str) -> Result<(), ValidationError> {
    if raw.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validate a book rating.
///
/// # Errors
///
/// Returns `ValidationError::RatingOutOfRange` if outside 1-5.
pub fn validate_rating(rating: u8) -> Result<(), ValidationError> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange)
    }
}
