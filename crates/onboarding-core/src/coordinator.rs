//! Registration coordinator: orchestrates the two-phase onboarding
//! flow over the store and notifier capabilities.

use crate::error::OnboardingError;
use crate::notify::ChallengeNotifier;
use crate::otp::OtpChallenge;
use crate::password;
use crate::policy::{validate_display_name, PasswordPolicy, StandardPasswordPolicy};
use crate::store::{ActivatedUser, PendingRegistration, Profile, StoreError, UserStore};
use chrono::{Duration, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, warn};

/// Calendar format for the date-of-birth field.
const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

/// How long an issued challenge record stays acceptable.
const DEFAULT_CHALLENGE_TTL_MINUTES: i64 = 60;

/// Raw pre-registration input.
///
/// Fields are expected to arrive normalized (trimmed, email
/// lower-cased) - that is the caller's concern. The raw password is
/// wrapped in [`SecretString`] and dropped as soon as it is hashed.
#[derive(Debug)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    /// `YYYY-MM-DD`, if supplied.
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub password: SecretString,
}

/// Owns the onboarding state machine and its invariants.
///
/// Holds no mutable in-process state; everything shared lives behind
/// the [`UserStore`]. Safe to clone into as many request handlers as
/// needed.
pub struct RegistrationCoordinator {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn ChallengeNotifier>,
    password_policy: Arc<dyn PasswordPolicy>,
    otp: OtpChallenge,
    challenge_ttl: Duration,
    hash_iterations: u32,
}

impl RegistrationCoordinator {
    pub fn new(store: Arc<dyn UserStore>, notifier: Arc<dyn ChallengeNotifier>) -> Self {
        Self {
            store,
            notifier,
            password_policy: Arc::new(StandardPasswordPolicy),
            otp: OtpChallenge::default(),
            challenge_ttl: Duration::minutes(DEFAULT_CHALLENGE_TTL_MINUTES),
            hash_iterations: password::DEFAULT_ITERATIONS,
        }
    }

    /// Replace the password strength policy.
    pub fn with_password_policy(mut self, policy: Arc<dyn PasswordPolicy>) -> Self {
        self.password_policy = policy;
        self
    }

    /// Replace the passcode issuer/verifier.
    pub fn with_otp(mut self, otp: OtpChallenge) -> Self {
        self.otp = otp;
        self
    }

    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    pub fn with_hash_iterations(mut self, iterations: u32) -> Self {
        self.hash_iterations = iterations;
        self
    }

    /// Phase one: validate credentials, issue a challenge, persist the
    /// pending registration and dispatch the code.
    ///
    /// Success means only that a challenge was issued and persisted -
    /// no account exists yet. If delivery fails after the record is
    /// persisted this returns [`OnboardingError::NotificationFailed`];
    /// the record survives and a retried pre-registration for the same
    /// email reports [`OnboardingError::DuplicateEmail`].
    pub async fn pre_register(&self, input: NewRegistration) -> Result<(), OnboardingError> {
        let NewRegistration {
            name,
            email,
            date_of_birth,
            phone,
            password,
        } = input;

        // An already-activated account wins outright.
        match self.store.find_activated_by_email(&email).await {
            Ok(user) if user.email_verified => return Err(OnboardingError::DuplicateEmail),
            Ok(_) | Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(OnboardingError::Store(err.to_string())),
        }

        self.password_policy.validate(password.expose_secret())?;
        validate_display_name(&name)?;

        let password_hash =
            password::hash_password_with_iterations(password.expose_secret(), self.hash_iterations)
                .map_err(|_| OnboardingError::HashingFailed)?;
        // The raw password is not needed past this point.
        drop(password);

        let date_of_birth = match date_of_birth.as_deref().filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, DATE_OF_BIRTH_FORMAT)
                    .map_err(|_| OnboardingError::InvalidDateOfBirth)?,
            ),
            None => None,
        };

        let challenge = self
            .otp
            .issue()
            .map_err(|_| OnboardingError::ChallengeIssueFailed)?;

        let record = PendingRegistration::new(
            email.clone(),
            password_hash,
            challenge.secret,
            Profile {
                name,
                date_of_birth,
                phone,
            },
            Utc::now(),
            self.challenge_ttl,
        );

        match self.store.insert_pending(record).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(OnboardingError::DuplicateEmail),
            Err(err) => {
                warn!(email = %email, error = %err, "failed to persist pending registration");
                return Err(OnboardingError::VerificationEntryCreationFailed);
            }
        }

        if let Err(err) = self.notifier.send_challenge(&email, &challenge.code).await {
            warn!(email = %email, error = %err, "failed to deliver verification code");
            return Err(OnboardingError::NotificationFailed);
        }

        info!(email = %email, "pre-registration recorded, challenge dispatched");
        Ok(())
    }

    /// Phase two: verify the submitted code and promote the pending
    /// registration into a durable account.
    ///
    /// The record-expiry check runs before code validation, and the
    /// already-verified guard makes replays report
    /// [`OnboardingError::AlreadyVerified`]. Account creation and the
    /// verified-flag update are separate store operations; the
    /// duplicate-account pre-check keeps a re-attempt safe if the flag
    /// update never landed (see DESIGN.md).
    pub async fn verify_and_activate(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(), OnboardingError> {
        let pending = match self.store.find_pending_by_email(email).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(OnboardingError::PendingRegistrationNotFound)
            }
            Err(err) => return Err(OnboardingError::Store(err.to_string())),
        };

        if pending.is_expired_at(Utc::now()) {
            return Err(OnboardingError::ChallengeExpired);
        }

        if pending.verified {
            return Err(OnboardingError::AlreadyVerified);
        }

        if !self.otp.verify(code, &pending.otp_secret) {
            return Err(OnboardingError::InvalidCode);
        }

        // Guards the window where a previous attempt created the
        // account but never flipped the verified flag.
        match self.store.find_activated_by_email(email).await {
            Ok(_) => return Err(OnboardingError::DuplicateEmail),
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(OnboardingError::Store(err.to_string())),
        }

        let user = ActivatedUser::from_pending(&pending, Utc::now());
        match self.store.insert_activated(user).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(OnboardingError::DuplicateEmail),
            Err(err) => return Err(OnboardingError::Store(err.to_string())),
        }

        self.store
            .mark_pending_verified(email)
            .await
            .map_err(|err| OnboardingError::Store(err.to_string()))?;

        info!(email = %email, "registration verified, account activated");
        Ok(())
    }
}
