//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the forms
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the forms service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Persistence backend selection and connection parameters.
    pub storage: StorageConfig,

    /// Per-action rate limits.
    pub rate_limits: RateLimitConfig,

    /// Notification email settings.
    pub notifications: NotificationConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Supported persistence backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// SQLite file (or `:memory:`).
    Sqlite,
    /// PostgreSQL server.
    #[serde(alias = "pgsql")]
    Postgres,
    /// Process-local store, lost on restart.
    Memory,
}

impl StorageDriver {
    /// Parse the driver names accepted in `DB_DRIVER`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "pgsql" | "postgres" | "postgresql" => Some(Self::Postgres),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend selector.
    pub driver: StorageDriver,

    /// SQLite database file; `:memory:` keeps it in process.
    pub sqlite_path: String,

    /// Database server host (postgres).
    pub host: String,

    /// Database server port (postgres).
    pub port: u16,

    /// Database name (postgres).
    pub database: String,

    /// Database user (postgres).
    pub user: String,

    /// Database password (postgres).
    pub password: String,

    /// Connection pool size.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::Sqlite,
            sqlite_path: "data.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5432,
            database: "app_db".to_string(),
            user: String::new(),
            password: String::new(),
            max_connections: 5,
        }
    }
}

/// Admission limit for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActionLimit {
    /// Maximum accepted calls inside the window.
    pub max_calls: u32,

    /// Trailing window length in seconds.
    pub window_secs: u64,
}

impl ActionLimit {
    pub const fn new(max_calls: u32, window_secs: u64) -> Self {
        Self {
            max_calls,
            window_secs,
        }
    }
}

/// Rate limiting configuration, one limit per action.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub quote: ActionLimit,
    pub subscribe: ActionLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            quote: ActionLimit::new(10, 60),
            subscribe: ActionLimit::new(6, 60),
        }
    }
}

/// How outgoing email leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Write messages to the log only.
    Log,
    /// POST messages as JSON to an HTTP mail relay.
    Relay,
}

/// Notification email configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Recipient of quote request notifications.
    pub admin_email: String,

    /// Sender address on every outgoing message.
    pub from_email: String,

    /// Company name used in subjects and bodies.
    pub brand_name: String,

    /// Selected transport.
    pub transport: MailTransport,

    /// Relay endpoint (transport = "relay").
    pub relay_url: Option<String>,

    /// Bearer token sent to the relay.
    pub relay_token: Option<String>,

    /// Upper bound on a single send attempt, in seconds.
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            admin_email: "info@rivernilleconstruction.co.ke".to_string(),
            from_email: "noreply@rivernilleconstruction.co.ke".to_string(),
            brand_name: "RiverNille".to_string(),
            transport: MailTransport::Log,
            relay_url: None,
            relay_token: None,
            timeout_secs: 10,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Require an `X-CSRF-Token` header on POST submissions.
    pub csrf_enabled: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Take the client IP from `X-Forwarded-For` (only behind a trusted proxy).
    pub trust_forwarded_for: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csrf_enabled: false,
            max_body_size: 64 * 1024, // 64KB
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
