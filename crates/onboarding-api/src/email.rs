//! Verification-code delivery channels.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use onboarding_core::{ChallengeNotifier, NotifyError};
use tracing::info;

const SUBJECT: &str = "Your verification code";

/// Delivers verification codes over SMTP.
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChallengeNotifier for SmtpNotifier {
    async fn send_challenge(&self, destination: &str, code: &str) -> Result<(), NotifyError> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let transport = SmtpTransport::relay(&self.config.host)
            .map_err(|e| NotifyError::Delivery(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        let email = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| NotifyError::Delivery(format!("invalid from address: {e}")))?,
            )
            .to(destination
                .parse()
                .map_err(|e| NotifyError::Delivery(format!("invalid to address: {e}")))?)
            .subject(SUBJECT)
            .body(format!("Your verification code is: {code}"))
            .map_err(|e| NotifyError::Delivery(format!("failed to build email: {e}")))?;

        transport
            .send(&email)
            .map_err(|e| NotifyError::Delivery(format!("SMTP send failed: {e}")))?;

        info!(email = %destination, "verification code sent");
        Ok(())
    }
}

/// Logs codes instead of sending them. The log line IS the delivery
/// channel here - local runs only, never production.
pub struct LogNotifier;

#[async_trait]
impl ChallengeNotifier for LogNotifier {
    async fn send_challenge(&self, destination: &str, code: &str) -> Result<(), NotifyError> {
        info!(email = %destination, code = %code, "verification code (log delivery)");
        Ok(())
    }
}
