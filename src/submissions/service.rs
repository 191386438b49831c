//! Orchestration for the quote and subscribe actions.
//!
//! ```text
//! rate limit ──▶ sanitize ──▶ validate ──▶ insert ──▶ notify (best effort)
//!    429            │            400         500           logged only
//! ```

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{NotificationConfig, RateLimitConfig};
use crate::notifications::{self, Mailer, NotificationError, OutgoingEmail};
use crate::observability::metrics;
use crate::security::rate_limit::{Clock, RateLimiter};
use crate::security::sanitize::sanitize_email;
use crate::storage::{Store, StorageError};
use crate::submissions::types::{Accepted, Action, FormFields, QuoteForm};
use crate::submissions::validation::{validate_quote, validate_subscription, ValidationError};

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("email already subscribed")]
    DuplicateSubscriber,

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Handles form submissions end to end.
pub struct SubmissionService {
    store: Arc<dyn Store>,
    limiter: RateLimiter,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    limits: RateLimitConfig,
    notifications: NotificationConfig,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        limits: RateLimitConfig,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(store.clone(), clock.clone()),
            store,
            mailer,
            clock,
            limits,
            notifications,
        }
    }

    /// Storage backend name.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Accept a quote request from `ip`.
    pub async fn handle_quote(&self, ip: &str, fields: &FormFields) -> Result<Accepted, SubmissionError> {
        // 1. Rate limit
        if !self.limiter.allow(ip, Action::Quote.as_str(), self.limits.quote).await {
            return Err(SubmissionError::RateLimited);
        }

        // 2. Sanitize, 3. Validate
        let form = QuoteForm::from_fields(fields);
        validate_quote(&form)?;

        // 4. Persist
        let email = notifications::quote_notification(&self.notifications, &form);
        let id = self
            .store
            .insert_quote(&form.into_record(self.clock.now()))
            .await?;
        tracing::info!(quote_id = id, client = %ip, "Quote request stored");

        // 5. Notify admin
        self.notify("quote_admin", &email).await;

        Ok(Accepted::QuoteReceived)
    }

    /// Subscribe an email address to the newsletter on behalf of `ip`.
    pub async fn handle_subscribe(&self, ip: &str, fields: &FormFields) -> Result<Accepted, SubmissionError> {
        // 1. Rate limit
        if !self.limiter.allow(ip, Action::Subscribe.as_str(), self.limits.subscribe).await {
            return Err(SubmissionError::RateLimited);
        }

        // 2. Sanitize, 3. Validate
        let address = sanitize_email(fields.get("email"));
        validate_subscription(&address)?;

        if self.store.subscriber_exists(&address).await? {
            return Err(SubmissionError::DuplicateSubscriber);
        }

        // 4. Persist; a concurrent insert can still win the unique constraint.
        let id = match self.store.insert_subscriber(&address, self.clock.now()).await {
            Ok(id) => id,
            Err(StorageError::Duplicate) => return Err(SubmissionError::DuplicateSubscriber),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(subscriber_id = id, client = %ip, "Subscriber stored");

        // 5. Welcome the subscriber
        let email = notifications::welcome_email(&self.notifications, &address);
        self.notify("welcome", &email).await;

        Ok(Accepted::Subscribed)
    }

    /// One send attempt, bounded by the configured timeout. Never fails.
    async fn notify(&self, kind: &'static str, email: &OutgoingEmail) {
        let timeout = Duration::from_secs(self.notifications.timeout_secs);
        let result = match tokio::time::timeout(timeout, self.mailer.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(self.notifications.timeout_secs)),
        };

        match result {
            Ok(()) => metrics::record_notification(kind, "sent"),
            Err(e) => {
                tracing::warn!(
                    kind,
                    transport = self.mailer.transport(),
                    error = %e,
                    "Notification email not sent"
                );
                metrics::record_notification(kind, "failed");
            }
        }
    }
}
