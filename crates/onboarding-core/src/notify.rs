//! Out-of-band delivery of verification codes.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivers a one-time passcode to the registrant.
///
/// Fire-and-forget from the coordinator's perspective: a failure is
/// terminal for the attempt and is never retried here. Implementations
/// must not be handed anything beyond the destination and the code.
#[async_trait]
pub trait ChallengeNotifier: Send + Sync {
    async fn send_challenge(&self, destination: &str, code: &str) -> Result<(), NotifyError>;
}
