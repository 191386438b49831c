//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (DB_*, ADMIN_EMAIL, APP_CSRF_ENABLED overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc with the server, store and mailer
//! ```
//!
//! # Design Decisions
//! - Config is built once at process start; nothing reads the environment later
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ActionLimit, AppConfig, ListenerConfig, LogFormat, MailTransport, NotificationConfig,
    ObservabilityConfig, RateLimitConfig, SecurityConfig, StorageConfig, StorageDriver,
    TimeoutConfig,
};
