//! Credential store capability: durable state for pending
//! registrations and activated accounts.
//!
//! The store is the sole authority on email uniqueness. Inserts are
//! atomic insert-or-reject operations - a duplicate is reported as
//! [`StoreError::Conflict`], never silently overwritten, and two
//! concurrent inserts for one email must yield exactly one success.

mod memory;

pub use memory::MemoryStore;

use crate::password;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record with this email already exists.
    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Io(String),
}

/// Immutable profile snapshot captured at pre-registration and
/// materialized verbatim into the activated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
}

/// A signup awaiting verification.
///
/// Created by pre-registration; the only mutation it ever sees is the
/// `verified` flag flipping once, on successful activation. Expiry is
/// not a state of its own - it is derived from `expires_at` at read
/// time. Records are never deleted here; stale-record cleanup is an
/// external housekeeping concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    /// Registration identity; one outstanding record per email.
    pub email: String,
    pub password_hash: String,
    /// Challenge secret the submitted code is verified against.
    pub otp_secret: String,
    pub profile: Profile,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

impl PendingRegistration {
    pub fn new(
        email: String,
        password_hash: String,
        otp_secret: String,
        profile: Profile,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            email,
            password_hash,
            otp_secret,
            profile,
            issued_at,
            expires_at: issued_at + ttl,
            verified: false,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A durable, usable account. Exists only as the promotion of a
/// verified pending registration, so `email_verified` is true by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub blocked: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl ActivatedUser {
    /// Promote a pending registration into an account.
    pub fn from_pending(pending: &PendingRegistration, now: DateTime<Utc>) -> Self {
        Self {
            name: pending.profile.name.clone(),
            email: pending.email.clone(),
            password_hash: pending.password_hash.clone(),
            date_of_birth: pending.profile.date_of_birth,
            phone: pending.profile.phone.clone(),
            blocked: false,
            email_verified: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted: false,
            last_login: None,
        }
    }

    pub fn check_password(&self, raw: &str) -> bool {
        password::verify_password(raw, &self.password_hash)
    }
}

/// Durable storage contract consumed by the coordinator.
///
/// Each operation is a single atomic unit at the store boundary: an
/// insert either lands a fully populated record or changes nothing.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a pending registration, rejecting a duplicate email with
    /// [`StoreError::Conflict`] rather than racing an inspect-then-write.
    async fn insert_pending(&self, record: PendingRegistration) -> Result<(), StoreError>;

    async fn find_pending_by_email(&self, email: &str)
        -> Result<PendingRegistration, StoreError>;

    /// Flip the pending record's `verified` flag. The snapshot itself
    /// is immutable.
    async fn mark_pending_verified(&self, email: &str) -> Result<(), StoreError>;

    async fn find_activated_by_email(&self, email: &str) -> Result<ActivatedUser, StoreError>;

    /// Insert an activated account, rejecting a duplicate email with
    /// [`StoreError::Conflict`].
    async fn insert_activated(&self, user: ActivatedUser) -> Result<(), StoreError>;
}
