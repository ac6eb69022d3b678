//! Password hashing.
//!
//! PBKDF2-HMAC-SHA-256 with a random per-user salt. The stored form is
//! self-describing (`pbkdf2-sha256$<iterations>$<salt>$<hash>`, hex
//! fields) so the iteration count can be raised without invalidating
//! existing hashes.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const OUTPUT_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("entropy source failure: {0}")]
    Rng(String),
}

/// Hash a raw password with [`DEFAULT_ITERATIONS`].
pub fn hash_password(raw: &str) -> Result<String, PasswordHashError> {
    hash_password_with_iterations(raw, DEFAULT_ITERATIONS)
}

/// Hash a raw password with an explicit iteration count.
pub fn hash_password_with_iterations(
    raw: &str,
    iterations: u32,
) -> Result<String, PasswordHashError> {
    let iterations = iterations.max(1);

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng()
        .try_fill_bytes(&mut salt)
        .map_err(|e| PasswordHashError::Rng(e.to_string()))?;

    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(raw.as_bytes(), &salt, iterations, &mut out);

    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(out)
    ))
}

/// Check a raw password against a stored hash.
///
/// Derives with the salt and iteration count recorded in the stored
/// form and compares in constant time. Malformed stored hashes verify
/// as false.
pub fn verify_password(raw: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(hash)) else {
        return false;
    };
    if expected.len() != OUTPUT_LEN || iterations == 0 {
        return false;
    }

    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(raw.as_bytes(), &salt, iterations, &mut out);
    out.ct_eq(&expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small iteration count: these tests exercise the format and the
    // comparison, not the work factor.
    const TEST_ITERATIONS: u32 = 10;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let stored = hash_password_with_iterations("Str0ng!Pass", TEST_ITERATIONS).unwrap();
        assert!(verify_password("Str0ng!Pass", &stored));
        assert!(!verify_password("Str0ng!Pass2", &stored));
    }

    #[test]
    fn test_stored_form_is_self_describing() {
        let stored = hash_password_with_iterations("Str0ng!Pass", TEST_ITERATIONS).unwrap();
        assert!(stored.starts_with("pbkdf2-sha256$10$"));
        assert_eq!(stored.split('$').count(), 4);
    }

    #[test]
    fn test_raw_password_never_appears_in_stored_form() {
        let stored = hash_password_with_iterations("Str0ng!Pass", TEST_ITERATIONS).unwrap();
        assert!(!stored.contains("Str0ng!Pass"));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let a = hash_password_with_iterations("Str0ng!Pass", TEST_ITERATIONS).unwrap();
        let b = hash_password_with_iterations("Str0ng!Pass", TEST_ITERATIONS).unwrap();
        assert_ne!(a, b);
        // Both still verify.
        assert!(verify_password("Str0ng!Pass", &a));
        assert!(verify_password("Str0ng!Pass", &b));
    }

    #[test]
    fn test_malformed_stored_hash_verifies_false() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "pbkdf2-sha256$10$zz$zz"));
        assert!(!verify_password("x", "bcrypt$10$00$00"));
        assert!(!verify_password("x", "pbkdf2-sha256$not-a-number$00$00"));
    }
}
