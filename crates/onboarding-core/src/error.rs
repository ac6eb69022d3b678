//! Error taxonomy for the onboarding flow.

use thiserror::Error;

/// Every failure mode of the two public operations, as a closed set.
///
/// Each outcome maps to exactly one variant so callers can match
/// exhaustively: validation failures carry the specific rule that was
/// broken, conflicts and lifecycle outcomes are distinguishable from
/// infrastructure faults, and nothing collapses into a catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnboardingError {
    /// An activated account (or an outstanding pending registration)
    /// already claims this email.
    #[error("email already exists")]
    DuplicateEmail,

    #[error("password too short")]
    PasswordTooShort,

    #[error("password too long")]
    PasswordTooLong,

    /// Missing at least one of: uppercase, lowercase, digit, symbol.
    #[error("password not safe")]
    PasswordTooWeak,

    #[error("name too short")]
    NameTooShort,

    #[error("name too long")]
    NameTooLong,

    #[error("name must not contain digits")]
    NameContainsDigit,

    /// Date of birth was supplied but is not a `YYYY-MM-DD` date.
    #[error("invalid date of birth format")]
    InvalidDateOfBirth,

    #[error("failed to hash password")]
    HashingFailed,

    /// The OTP secret could not be generated (entropy source failure).
    #[error("failed to issue challenge")]
    ChallengeIssueFailed,

    /// The pending registration could not be persisted for a reason
    /// other than a duplicate email.
    #[error("failed to create verification entry")]
    VerificationEntryCreationFailed,

    /// The code was issued and persisted but could not be delivered.
    /// The pending record survives; see the coordinator docs for the
    /// retry story.
    #[error("failed to deliver verification code")]
    NotificationFailed,

    #[error("pending registration not found")]
    PendingRegistrationNotFound,

    /// The pending record's 60-minute window has elapsed. Checked
    /// before the code itself is validated.
    #[error("challenge expired")]
    ChallengeExpired,

    /// The pending record was already consumed by a successful
    /// verification. Guards against replay and double-submit.
    #[error("email already verified")]
    AlreadyVerified,

    /// The submitted code does not match the stored challenge secret.
    #[error("invalid verification code")]
    InvalidCode,

    /// An I/O failure from the credential store that is not one of the
    /// expected conflict/not-found outcomes.
    #[error("storage error: {0}")]
    Store(String),
}
