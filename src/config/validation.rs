//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, body limit > 0)
//! - Check that addresses parse and email settings are usable
//! - Check that the selected backend/transport has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{AppConfig, MailTransport, StorageDriver};
use crate::submissions::validation::is_valid_email;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{field}: {value:?} is not a socket address")]
    BadAddress { field: &'static str, value: String },

    #[error("{field}: {value:?} is not a valid email address")]
    BadEmail { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: required when {reason}")]
    Missing { field: &'static str, reason: &'static str },

    #[error("{field} ({value}s) must be shorter than {limit_field} ({limit}s)")]
    NotBelow {
        field: &'static str,
        value: u64,
        limit_field: &'static str,
        limit: u64,
    },
}

/// Validate a parsed configuration, collecting every issue found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::BadAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::BadAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let notifications = &config.notifications;
    if !is_valid_email(&notifications.admin_email) {
        issues.push(ConfigIssue::BadEmail {
            field: "notifications.admin_email",
            value: notifications.admin_email.clone(),
        });
    }
    if !is_valid_email(&notifications.from_email) {
        issues.push(ConfigIssue::BadEmail {
            field: "notifications.from_email",
            value: notifications.from_email.clone(),
        });
    }
    if notifications.transport == MailTransport::Relay
        && notifications.relay_url.as_deref().map_or(true, |u| u.trim().is_empty())
    {
        issues.push(ConfigIssue::Missing {
            field: "notifications.relay_url",
            reason: "transport is \"relay\"",
        });
    }
    if notifications.timeout_secs == 0 {
        issues.push(ConfigIssue::Zero { field: "notifications.timeout_secs" });
    }

    if config.rate_limits.quote.window_secs == 0 {
        issues.push(ConfigIssue::Zero { field: "rate_limits.quote.window_secs" });
    }
    if config.rate_limits.subscribe.window_secs == 0 {
        issues.push(ConfigIssue::Zero { field: "rate_limits.subscribe.window_secs" });
    }

    if config.security.max_body_size == 0 {
        issues.push(ConfigIssue::Zero { field: "security.max_body_size" });
    }
    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::Zero { field: "timeouts.request_secs" });
    }
    // The notification is sent inside the request, after the insert.
    if notifications.timeout_secs >= config.timeouts.request_secs {
        issues.push(ConfigIssue::NotBelow {
            field: "notifications.timeout_secs",
            value: notifications.timeout_secs,
            limit_field: "timeouts.request_secs",
            limit: config.timeouts.request_secs,
        });
    }

    let storage = &config.storage;
    match storage.driver {
        StorageDriver::Sqlite if storage.sqlite_path.trim().is_empty() => {
            issues.push(ConfigIssue::Missing {
                field: "storage.sqlite_path",
                reason: "driver is \"sqlite\"",
            });
        }
        StorageDriver::Postgres => {
            if storage.host.trim().is_empty() {
                issues.push(ConfigIssue::Missing {
                    field: "storage.host",
                    reason: "driver is \"postgres\"",
                });
            }
            if storage.database.trim().is_empty() {
                issues.push(ConfigIssue::Missing {
                    field: "storage.database",
                    reason: "driver is \"postgres\"",
                });
            }
        }
        _ => {}
    }
    if storage.driver != StorageDriver::Memory && storage.max_connections == 0 {
        issues.push(ConfigIssue::Zero { field: "storage.max_connections" });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
