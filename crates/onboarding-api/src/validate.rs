//! Request-shape validation at the edge.
//!
//! These checks reject obviously malformed input before the core
//! runs; the core owns the real credential rules.

use crate::error::ApiError;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::MissingEmail);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::InvalidEmail);
    }
    Ok(())
}

/// Phone numbers are optional; when present they must be 11 digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ApiError> {
    if phone.len() != 11 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidPhoneNumber);
    }
    Ok(())
}

pub fn validate_code_shape(code: &str) -> Result<(), ApiError> {
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidCodeFormat);
    }
    Ok(())
}
