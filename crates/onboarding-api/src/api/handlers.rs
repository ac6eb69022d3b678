//! HTTP request handlers.

use super::types::{
    HealthResponse, PreRegisterRequest, PreRegisterResponse, VerifyRequest, VerifyResponse,
};
use super::AppState;
use crate::error::ApiError;
use crate::validate::{validate_code_shape, validate_email, validate_phone_number};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use onboarding_core::NewRegistration;
use tracing::info;

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Start a registration: validate, issue a challenge, email the code.
pub async fn pre_register(
    State(state): State<AppState>,
    Json(request): Json<PreRegisterRequest>,
) -> Result<(StatusCode, Json<PreRegisterResponse>), ApiError> {
    // Normalize before anything else; the core expects trimmed fields
    // and a lower-cased email.
    let name = request.name.trim().to_string();
    let email = request.email.trim().to_lowercase();
    let date_of_birth = normalize_optional(request.date_of_birth);
    let phone = normalize_optional(request.phone_number);

    validate_email(&email)?;
    if let Some(phone) = phone.as_deref() {
        validate_phone_number(phone)?;
    }

    info!(email = %email, "pre-registration request received");

    state
        .coordinator
        .pre_register(NewRegistration {
            name,
            email: email.clone(),
            date_of_birth,
            phone,
            password: request.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PreRegisterResponse {
            email,
            status: "pending".to_string(),
            message: "Verification code sent. Submit it to /api/v1/user/register to activate."
                .to_string(),
        }),
    ))
}

/// Complete a registration: verify the code and activate the account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<(StatusCode, Json<VerifyResponse>), ApiError> {
    let email = request.email.trim().to_lowercase();
    let code = request.otp.trim();

    validate_email(&email)?;
    validate_code_shape(code)?;

    info!(email = %email, "verification request received");

    state.coordinator.verify_and_activate(&email, code).await?;

    Ok((
        StatusCode::CREATED,
        Json(VerifyResponse {
            email,
            status: "active".to_string(),
            message: "Account activated.".to_string(),
        }),
    ))
}

fn normalize_optional(field: Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
