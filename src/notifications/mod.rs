//! Notification email subsystem.
//!
//! # Responsibilities
//! - Build the admin notification for a quote and the subscriber welcome email
//! - Hand messages to the configured transport
//!
//! # Design Decisions
//! - Best effort: callers log and count failures, never retry, never fail the request
//! - Transport is a trait object chosen once at startup
//! - Subjects never contain control characters, so user input cannot add headers

pub mod capture;
pub mod log;
pub mod relay;

use std::sync::Arc;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{MailTransport, NotificationConfig};
use crate::submissions::types::QuoteForm;

pub use capture::CaptureMailer;
pub use self::log::LogMailer;
pub use relay::RelayMailer;

/// Errors that can occur while sending a notification.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Transport is misconfigured.
    #[error("Mail configuration error: {0}")]
    Configuration(String),

    /// Transport refused or failed the message.
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    /// Send did not finish within the configured timeout.
    #[error("Email send timed out after {0} seconds")]
    Timeout(u64),
}

pub type NotificationResult<T> = Result<T, NotificationError>;

/// A single outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery mechanism for outgoing email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()>;

    /// Transport name for logs.
    fn transport(&self) -> &'static str;
}

/// Build the transport selected in `config`.
pub fn build_mailer(config: &NotificationConfig) -> NotificationResult<Arc<dyn Mailer>> {
    match config.transport {
        MailTransport::Log => Ok(Arc::new(LogMailer)),
        MailTransport::Relay => Ok(Arc::new(RelayMailer::from_config(config)?)),
    }
}

/// Replace control characters (CR, LF, TAB, ...) with spaces.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Admin notification for a newly stored quote request.
pub fn quote_notification(config: &NotificationConfig, form: &QuoteForm) -> OutgoingEmail {
    OutgoingEmail {
        from: config.from_email.clone(),
        to: config.admin_email.clone(),
        reply_to: Some(header_safe(&form.email)),
        subject: header_safe(&format!("New Quote Request from {}", form.name)),
        body: format!(
            "Name: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}",
            form.name, form.email, form.phone, form.message
        ),
    }
}

/// Welcome email for a new subscriber.
pub fn welcome_email(config: &NotificationConfig, email: &str) -> OutgoingEmail {
    OutgoingEmail {
        from: config.from_email.clone(),
        to: header_safe(email),
        reply_to: None,
        subject: header_safe(&format!("Welcome to {} Newsletter", config.brand_name)),
        body: format!(
            "Thank you for subscribing to {} updates!\n\n\
             We'll keep you informed about our latest projects and services.",
            config.brand_name
        ),
    }
}
