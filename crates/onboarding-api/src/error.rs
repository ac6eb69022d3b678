//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use onboarding_core::OnboardingError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no email input given")]
    MissingEmail,

    #[error("invalid email format")]
    InvalidEmail,

    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("verification code must be 6 digits")]
    InvalidCodeFormat,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingEmail => (StatusCode::BAD_REQUEST, "MISSING_EMAIL"),
            ApiError::InvalidEmail => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            ApiError::InvalidPhoneNumber => (StatusCode::BAD_REQUEST, "INVALID_PHONE_NUMBER"),
            ApiError::InvalidCodeFormat => (StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT"),
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            ApiError::Onboarding(err) => match err {
                OnboardingError::DuplicateEmail => (StatusCode::CONFLICT, "DUPLICATE_EMAIL"),
                OnboardingError::PasswordTooShort => {
                    (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT")
                }
                OnboardingError::PasswordTooLong => (StatusCode::BAD_REQUEST, "PASSWORD_TOO_LONG"),
                OnboardingError::PasswordTooWeak => (StatusCode::BAD_REQUEST, "PASSWORD_TOO_WEAK"),
                OnboardingError::NameTooShort => (StatusCode::BAD_REQUEST, "NAME_TOO_SHORT"),
                OnboardingError::NameTooLong => (StatusCode::BAD_REQUEST, "NAME_TOO_LONG"),
                OnboardingError::NameContainsDigit => {
                    (StatusCode::BAD_REQUEST, "NAME_CONTAINS_DIGIT")
                }
                OnboardingError::InvalidDateOfBirth => {
                    (StatusCode::BAD_REQUEST, "INVALID_DATE_OF_BIRTH")
                }
                OnboardingError::PendingRegistrationNotFound => {
                    (StatusCode::NOT_FOUND, "PENDING_REGISTRATION_NOT_FOUND")
                }
                OnboardingError::ChallengeExpired => (StatusCode::BAD_REQUEST, "CHALLENGE_EXPIRED"),
                OnboardingError::AlreadyVerified => (StatusCode::CONFLICT, "ALREADY_VERIFIED"),
                OnboardingError::InvalidCode => (StatusCode::BAD_REQUEST, "INVALID_CODE"),
                OnboardingError::NotificationFailed => {
                    (StatusCode::BAD_GATEWAY, "NOTIFICATION_FAILED")
                }
                OnboardingError::HashingFailed
                | OnboardingError::ChallengeIssueFailed
                | OnboardingError::VerificationEntryCreationFailed
                | OnboardingError::Store(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
