//! Input validation for phone numbers and addresses
//!
//! Pure functions, no I/O. Both return the canonical (whitespace-stripped)
//! value on success.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Upper bound on the raw phone input, before stripping whitespace
pub const PHONE_MAX_RAW_LEN: usize = 20;

/// Upper bound on the raw address input, in characters
pub const ADDRESS_MAX_LEN: usize = 500;

/// E.164: optional `+`, a non-zero digit, then 1 to 14 more digits
static E164_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[1-9]\d{1,14}$").expect("E.164 pattern is a valid regex")
});

/// Client-caused input errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Phone number must be in E.164 format: + followed by 1-15 digits, starting with a non-zero digit")]
    InvalidPhone,

    #[error("Address cannot be empty or contain only whitespace")]
    EmptyAddress,

    #[error("Address must be at most {max} characters (got {actual})")]
    AddressTooLong { max: usize, actual: usize },
}

/// Validate a phone number and return it without surrounding whitespace
pub fn validate_phone(raw: &str) -> Result<String, ValidationError> {
    if raw.chars().count() > PHONE_MAX_RAW_LEN {
        return Err(ValidationError::InvalidPhone);
    }

    let phone = raw.trim();
    // `\d` is Unicode-aware; restrict to ASCII digits explicitly
    if !phone.is_ascii() || !E164_PATTERN.is_match(phone) {
        return Err(ValidationError::InvalidPhone);
    }

    Ok(phone.to_string())
}

/// Validate an address and return it trimmed
pub fn validate_address(raw: &str) -> Result<String, ValidationError> {
    let length = raw.chars().count();
    if length > ADDRESS_MAX_LEN {
        return Err(ValidationError::AddressTooLong {
            max: ADDRESS_MAX_LEN,
            actual: length,
        });
    }

    let address = raw.trim();
    if address.is_empty() {
        return Err(ValidationError::EmptyAddress);
    }

    Ok(address.to_string())
}
