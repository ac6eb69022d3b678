//! Credential validation rules. Pure functions, no I/O.

use crate::error::OnboardingError;

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 64;
const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 200;

/// Password strength strategy.
///
/// Injected into the coordinator at construction so deployments (and
/// tests) can swap the rules; [`StandardPasswordPolicy`] is the
/// default.
pub trait PasswordPolicy: Send + Sync {
    fn validate(&self, raw: &str) -> Result<(), OnboardingError>;
}

/// Default policy: length in `[8, 64]` and at least one uppercase
/// letter, one lowercase letter, one digit and one symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPasswordPolicy;

impl PasswordPolicy for StandardPasswordPolicy {
    fn validate(&self, raw: &str) -> Result<(), OnboardingError> {
        if raw.len() < PASSWORD_MIN_LEN {
            return Err(OnboardingError::PasswordTooShort);
        }
        if raw.len() > PASSWORD_MAX_LEN {
            return Err(OnboardingError::PasswordTooLong);
        }

        let mut has_uppercase = false;
        let mut has_lowercase = false;
        let mut has_digit = false;
        let mut has_symbol = false;

        for ch in raw.chars() {
            if ch.is_uppercase() {
                has_uppercase = true;
            } else if ch.is_lowercase() {
                has_lowercase = true;
            } else if ch.is_numeric() {
                has_digit = true;
            } else if !ch.is_whitespace() {
                has_symbol = true;
            }
        }

        if has_uppercase && has_lowercase && has_digit && has_symbol {
            Ok(())
        } else {
            Err(OnboardingError::PasswordTooWeak)
        }
    }
}

/// Validate a display name: length in `[2, 200]`, no digit characters.
pub fn validate_display_name(name: &str) -> Result<(), OnboardingError> {
    if name.len() < NAME_MIN_LEN {
        return Err(OnboardingError::NameTooShort);
    }
    if name.len() > NAME_MAX_LEN {
        return Err(OnboardingError::NameTooLong);
    }
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(OnboardingError::NameContainsDigit);
    }
    Ok(())
}
