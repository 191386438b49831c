//! SQLite backend.

use std::str::FromStr;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::{map_insert_error, NewQuote, RateLimitEvent, Store, StorageResult};
use crate::config::StorageConfig;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS subscribers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE NOT NULL,
        subscribed_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS quotes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        message TEXT,
        submitted_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS rate_limits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ip TEXT NOT NULL,
        action TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_rate_limits_lookup ON rate_limits (ip, action, created_at)",
];

/// [`Store`] backed by a SQLite database through sqlx.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `config.sqlite_path`.
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        let in_memory = config.sqlite_path == ":memory:";

        let (options, max_connections) = if in_memory {
            // Every connection to :memory: is its own database; keep exactly one.
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else {
            (
                SqliteConnectOptions::new()
                    .filename(&config.sqlite_path)
                    .create_if_missing(true),
                config.max_connections.max(1),
            )
        };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.create_tables().await?;

        tracing::info!(path = %config.sqlite_path, "SQLite store opened");
        Ok(store)
    }

    async fn create_tables(&self) -> StorageResult<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_quote(&self, quote: &NewQuote) -> StorageResult<i64> {
        let result = sqlx::query(
            "INSERT INTO quotes (name, email, phone, message, submitted_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&quote.name)
        .bind(&quote.email)
        .bind(&quote.phone)
        .bind(&quote.message)
        .bind(quote.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(result.last_insert_rowid())
    }

    async fn insert_subscriber(&self, email: &str, subscribed_at: i64) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO subscribers (email, subscribed_at) VALUES (?, ?)")
            .bind(email)
            .bind(subscribed_at)
            .execute(&self.pool)
            .await
            .map_err(map_insert_error)?;
        Ok(result.last_insert_rowid())
    }

    async fn subscriber_exists(&self, email: &str) -> StorageResult<bool> {
        let row: Option<i64> = sqlx::query_scalar("SELECT id FROM subscribers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count_recent_events(&self, ip: &str, action: &str, since: i64) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rate_limits WHERE ip = ? AND action = ? AND created_at >= ?",
        )
        .bind(ip)
        .bind(action)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn prune_events(&self, before: i64) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE created_at < ?")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn record_event(&self, event: &RateLimitEvent) -> StorageResult<()> {
        sqlx::query("INSERT INTO rate_limits (ip, action, created_at) VALUES (?, ?, ?)")
            .bind(&event.ip)
            .bind(&event.action)
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
