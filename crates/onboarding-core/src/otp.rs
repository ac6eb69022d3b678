//! Time-stepped one-time passcodes.
//!
//! Minimal TOTP (RFC 6238 counter schedule, RFC 4226 dynamic
//! truncation) over HMAC-SHA-256. Intentionally small: the secret
//! never leaves the service, so there is no provisioning-URI or
//! authenticator-app interop to carry.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Passcode length in digits.
const DIGITS: u32 = 6;

/// Secret length in bytes (160 bits).
const SECRET_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("entropy source failure: {0}")]
    Rng(String),
}

/// A freshly issued challenge: the secret to persist and the passcode
/// to deliver out-of-band.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    /// Hex-encoded random secret, stored on the pending registration.
    pub secret: String,
    /// Six-digit passcode for the current time step.
    pub code: String,
}

/// Issues and verifies time-stepped passcodes.
///
/// `period` is the time-step length in seconds; `skew` is how many
/// adjacent steps on either side are accepted at verification time.
/// The same tolerance applies at issuance and verification.
#[derive(Debug, Clone, Copy)]
pub struct OtpChallenge {
    period: u64,
    skew: u64,
}

impl Default for OtpChallenge {
    fn default() -> Self {
        Self { period: 30, skew: 1 }
    }
}

impl OtpChallenge {
    pub fn new(period: u64, skew: u64) -> Self {
        Self {
            period: period.max(1),
            skew,
        }
    }

    /// Generate a fresh secret and the passcode for the current time
    /// step. Fails only if the entropy source does.
    pub fn issue(&self) -> Result<IssuedChallenge, OtpError> {
        let mut secret = [0u8; SECRET_LEN];
        rand::thread_rng()
            .try_fill_bytes(&mut secret)
            .map_err(|e| OtpError::Rng(e.to_string()))?;
        let secret = hex::encode(secret);

        let code = self
            .code_at(&secret, Utc::now().timestamp())
            .ok_or_else(|| OtpError::Rng("generated secret is unusable".into()))?;

        Ok(IssuedChallenge { secret, code })
    }

    /// Check a submitted code against the stored secret at the current
    /// instant. Malformed input verifies as false, never an error.
    pub fn verify(&self, code: &str, secret: &str) -> bool {
        self.verify_at(code, secret, Utc::now().timestamp())
    }

    /// Time-explicit form of [`verify`](Self::verify), for callers and
    /// tests that need a fixed instant.
    pub fn verify_at(&self, code: &str, secret: &str, unix: i64) -> bool {
        if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let counter = self.counter_at(unix);
        let mut matched = false;
        for step in counter.saturating_sub(self.skew)..=counter.saturating_add(self.skew) {
            if let Some(expected) = code_for_counter(secret, step) {
                matched |= bool::from(expected.as_bytes().ct_eq(code.as_bytes()));
            }
        }
        matched
    }

    /// Compute the passcode for the time step containing `unix`.
    /// Returns `None` if the secret is not valid hex.
    pub fn code_at(&self, secret: &str, unix: i64) -> Option<String> {
        code_for_counter(secret, self.counter_at(unix))
    }

    fn counter_at(&self, unix: i64) -> u64 {
        (unix.max(0) as u64) / self.period
    }
}

/// RFC 4226 dynamic truncation over HMAC-SHA-256.
fn code_for_counter(secret: &str, counter: u64) -> Option<String> {
    let key = hex::decode(secret).ok()?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    let code = binary % 10u32.pow(DIGITS);
    Some(format!("{code:06}"))
}
