//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! SubmissionService ──▶ Store::insert_quote / insert_subscriber / subscriber_exists
//! RateLimiter       ──▶ Store::prune_events / count_recent_events / record_event
//!                          │
//!                          ├─ memory.rs   (process-local, tests and demos)
//!                          ├─ sqlite.rs   (sqlx, file or :memory:)
//!                          └─ postgres.rs (sqlx, server)
//! ```
//!
//! # Design Decisions
//! - One trait for every backend; DDL lives inside each backend
//! - Quotes and subscribers are insert-only, rate-limit events append/delete
//! - Subscriber uniqueness is also a store constraint; violations map to
//!   `StorageError::Duplicate`

pub mod memory;
pub mod postgres;
pub mod sqlite;

use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StorageConfig, StorageDriver};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Driver-level failure (connection, query, decode).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the insert.
    #[error("record already exists")]
    Duplicate,

    /// Backend cannot serve requests.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A single admitted call, used for sliding-window counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEvent {
    pub ip: String,
    pub action: String,
    /// Unix seconds.
    pub created_at: i64,
}

/// A quote request ready to be persisted. Fields are already sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// Unix seconds.
    pub submitted_at: i64,
}

/// A stored quote row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuote {
    pub id: i64,
    pub quote: NewQuote,
}

/// A stored newsletter subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    /// Unix seconds.
    pub subscribed_at: i64,
}

/// Persistence interface shared by every backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a quote request, returning its id.
    async fn insert_quote(&self, quote: &NewQuote) -> StorageResult<i64>;

    /// Insert a subscriber, returning its id. Fails with
    /// [`StorageError::Duplicate`] when the email is already present.
    async fn insert_subscriber(&self, email: &str, subscribed_at: i64) -> StorageResult<i64>;

    /// Exact-match lookup on the subscriber email.
    async fn subscriber_exists(&self, email: &str) -> StorageResult<bool>;

    /// Count events for `ip`/`action` with `created_at >= since`.
    async fn count_recent_events(&self, ip: &str, action: &str, since: i64) -> StorageResult<u64>;

    /// Delete every event with `created_at < before`, for all keys.
    /// Returns the number of rows removed.
    async fn prune_events(&self, before: i64) -> StorageResult<u64>;

    /// Append an event.
    async fn record_event(&self, event: &RateLimitEvent) -> StorageResult<()>;

    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Open the configured backend and make sure its schema exists.
pub async fn connect(config: &StorageConfig) -> StorageResult<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.driver {
        StorageDriver::Memory => Arc::new(MemoryStore::new()),
        StorageDriver::Sqlite => Arc::new(SqliteStore::connect(config).await?),
        StorageDriver::Postgres => Arc::new(PgStore::connect(config).await?),
    };

    tracing::info!(backend = store.backend(), "Storage ready");
    Ok(store)
}

/// Map an insert failure, turning unique violations into `Duplicate`.
pub(crate) fn map_insert_error(err: sqlx::Error) -> StorageError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        StorageError::Duplicate
    } else {
        StorageError::Database(err)
    }
}
