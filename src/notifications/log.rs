//! Log-only transport.

use async_trait::async_trait;

use super::{Mailer, NotificationResult, OutgoingEmail};

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email logged (log transport, not delivered)"
        );
        tracing::debug!(body = %email.body, "Logged email body");
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "log"
    }
}
