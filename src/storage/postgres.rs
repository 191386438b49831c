//! PostgreSQL backend.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use super::{map_insert_error, NewQuote, RateLimitEvent, Store, StorageResult};
use crate::config::StorageConfig;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS subscribers (
        id BIGSERIAL PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        subscribed_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS quotes (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        message TEXT,
        submitted_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS rate_limits (
        id BIGSERIAL PRIMARY KEY,
        ip TEXT NOT NULL,
        action TEXT NOT NULL,
        created_at BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_rate_limits_lookup ON rate_limits (ip, action, created_at)",
];

/// [`Store`] backed by a PostgreSQL server through sqlx.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect using the host/port/database/credentials from `config`.
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database);
        if !config.user.is_empty() {
            options = options.username(&config.user);
        }
        if !config.password.is_empty() {
            options = options.password(&config.password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&pool).await?;
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "PostgreSQL store connected"
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_quote(&self, quote: &NewQuote) -> StorageResult<i64> {
        sqlx::query_scalar(
            "INSERT INTO quotes (name, email, phone, message, submitted_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&quote.name)
        .bind(&quote.email)
        .bind(&quote.phone)
        .bind(&quote.message)
        .bind(quote.submitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn insert_subscriber(&self, email: &str, subscribed_at: i64) -> StorageResult<i64> {
        sqlx::query_scalar(
            "INSERT INTO subscribers (email, subscribed_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(email)
        .bind(subscribed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn subscriber_exists(&self, email: &str) -> StorageResult<bool> {
        let row: Option<i64> = sqlx::query_scalar("SELECT id FROM subscribers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count_recent_events(&self, ip: &str, action: &str, since: i64) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rate_limits WHERE ip = $1 AND action = $2 AND created_at >= $3",
        )
        .bind(ip)
        .bind(action)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn prune_events(&self, before: i64) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE created_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn record_event(&self, event: &RateLimitEvent) -> StorageResult<()> {
        sqlx::query("INSERT INTO rate_limits (ip, action, created_at) VALUES ($1, $2, $3)")
            .bind(&event.ip)
            .bind(&event.action)
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
