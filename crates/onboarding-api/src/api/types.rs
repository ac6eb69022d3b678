//! API request and response types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Request to start a registration.
#[derive(Debug, Deserialize)]
pub struct PreRegisterRequest {
    pub name: String,

    pub email: String,

    /// `YYYY-MM-DD`, optional
    #[serde(default)]
    pub date_of_birth: Option<String>,

    /// 11-digit phone number, optional
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Raw password; redacted from debug output and dropped after
    /// hashing
    pub password: SecretString,
}

/// Response after starting a registration.
#[derive(Debug, Serialize)]
pub struct PreRegisterResponse {
    pub email: String,
    pub status: String,
    pub message: String,
}

/// Request to verify a registration with the emailed code.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub otp: String,
}

/// Response after verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub email: String,
    pub status: String,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
