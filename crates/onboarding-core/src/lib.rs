//! User onboarding core - two-phase registration state machine.
//!
//! The flow has two public operations:
//! - [`RegistrationCoordinator::pre_register`] validates credentials,
//!   issues a one-time passcode challenge, persists a pending
//!   registration and dispatches the code out-of-band
//! - [`RegistrationCoordinator::verify_and_activate`] checks the code
//!   against the stored challenge and promotes the pending registration
//!   into a durable, activated account
//!
//! Durable state lives behind the [`UserStore`] capability; code
//! delivery behind [`ChallengeNotifier`]. The coordinator itself holds
//! no mutable shared state.

pub mod coordinator;
pub mod error;
pub mod notify;
pub mod otp;
pub mod password;
pub mod policy;
pub mod store;

pub use coordinator::{NewRegistration, RegistrationCoordinator};
pub use error::OnboardingError;
pub use notify::{ChallengeNotifier, NotifyError};
pub use otp::{IssuedChallenge, OtpChallenge};
pub use policy::{PasswordPolicy, StandardPasswordPolicy};
pub use store::{ActivatedUser, MemoryStore, PendingRegistration, Profile, StoreError, UserStore};
