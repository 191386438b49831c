//! In-memory transport that records every message.
//!
//! Used in tests and local demos. Can be switched into a failing mode to
//! exercise the best-effort paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;

use super::{Mailer, NotificationError, NotificationResult, OutgoingEmail};

#[derive(Debug, Default)]
pub struct CaptureMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: AtomicBool,
}

impl CaptureMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails (after being recorded as an attempt).
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every send attempt so far, including failed ones.
    pub fn attempts(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().expect("capture mailer mutex poisoned").clone()
    }
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()> {
        self.sent
            .lock()
            .expect("capture mailer mutex poisoned")
            .push(email.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("capture mailer set to fail".to_string()));
        }
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "capture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutgoingEmail {
        OutgoingEmail {
            from: "noreply@example.com".into(),
            to: "a@example.com".into(),
            reply_to: None,
            subject: "Hi".into(),
            body: "Body".into(),
        }
    }

    #[tokio::test]
    async fn test_records_attempts_even_when_failing() {
        let mailer = CaptureMailer::new();
        mailer.send(&message()).await.unwrap();

        mailer.set_failing(true);
        assert!(mailer.send(&message()).await.is_err());
        assert_eq!(mailer.attempts().len(), 2);
    }
}
