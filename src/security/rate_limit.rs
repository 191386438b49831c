//! Sliding-window rate limiting backed by persisted events.
//!
//! # Algorithm
//! ```text
//! threshold = now - window
//! prune every event older than threshold        (all keys)
//! count events for (ip, action) since threshold
//! count >= max_calls → reject, nothing recorded
//! otherwise          → record (ip, action, now), admit
//! ```
//!
//! # Design Decisions
//! - Fails open: a storage error admits the call and is logged
//! - Pruning is lazy, done on every check; no background task
//! - Check and insert are separate store calls, so concurrent requests on
//!   a SQL backend can briefly overshoot `max_calls`

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::ActionLimit;
use crate::observability::metrics;
use crate::storage::{RateLimitEvent, Store, StorageResult};

/// Source of "now" in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self { now: AtomicI64::new(start) }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Per-IP, per-action admission control.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Decide whether `ip` may perform `action` now.
    ///
    /// Returns `true` and records the call when admitted. Storage failures
    /// admit the call.
    pub async fn allow(&self, ip: &str, action: &str, limit: ActionLimit) -> bool {
        match self.check(ip, action, limit).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(client = %ip, action, max_calls = limit.max_calls, "Rate limit exceeded");
                metrics::record_rate_limited(action);
                false
            }
            Err(e) => {
                tracing::error!(client = %ip, action, error = %e, "Rate limiter storage failure; admitting request");
                metrics::record_rate_limiter_error();
                true
            }
        }
    }

    async fn check(&self, ip: &str, action: &str, limit: ActionLimit) -> StorageResult<bool> {
        let now = self.clock.now();
        let threshold = now.saturating_sub(limit.window_secs.min(i64::MAX as u64) as i64);

        let pruned = self.store.prune_events(threshold).await?;
        if pruned > 0 {
            tracing::debug!(pruned, "Expired rate limit events removed");
        }

        let count = self.store.count_recent_events(ip, action, threshold).await?;
        if count >= u64::from(limit.max_calls) {
            return Ok(false);
        }

        self.store
            .record_event(&RateLimitEvent {
                ip: ip.to_string(),
                action: action.to_string(),
                created_at: now,
            })
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::storage::{MemoryStore, NewQuote, StorageError};

    const LIMIT: ActionLimit = ActionLimit::new(3, 60);

    fn limiter_at(start: i64) -> (RateLimiter, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start));
        let limiter = RateLimiter::new(store.clone(), clock.clone());
        (limiter, store, clock)
    }

    #[tokio::test]
    async fn test_admits_up_to_max_calls() {
        let (limiter, store, _clock) = limiter_at(1_000);

        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1", "quote", LIMIT).await);
        }
        assert!(!limiter.allow("10.0.0.1", "quote", LIMIT).await);
        assert!(!limiter.allow("10.0.0.1", "quote", LIMIT).await);

        // Rejected calls are not recorded.
        assert_eq!(store.event_count(), 3);
    }

    #[tokio::test]
    async fn test_window_rolls_forward() {
        let (limiter, _store, clock) = limiter_at(1_000);

        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1", "quote", LIMIT).await);
            clock.advance(10);
        }
        // now = 1030; events at 1000, 1010, 1020
        assert!(!limiter.allow("10.0.0.1", "quote", LIMIT).await);

        // threshold 1001: the 1000 event drops out.
        clock.set(1_061);
        assert!(limiter.allow("10.0.0.1", "quote", LIMIT).await);
        assert!(!limiter.allow("10.0.0.1", "quote", LIMIT).await);

        // Once the window has passed the last admitted call, the key is free again.
        clock.set(1_061 + 61);
        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1", "quote", LIMIT).await);
        }
    }

    #[tokio::test]
    async fn test_event_exactly_at_threshold_still_counts() {
        let (limiter, _store, clock) = limiter_at(0);
        let one = ActionLimit::new(1, 60);

        assert!(limiter.allow("10.0.0.1", "quote", one).await);
        clock.set(60);
        assert!(!limiter.allow("10.0.0.1", "quote", one).await);
        clock.set(61);
        assert!(limiter.allow("10.0.0.1", "quote", one).await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (limiter, _store, _clock) = limiter_at(1_000);
        let one = ActionLimit::new(1, 60);

        assert!(limiter.allow("10.0.0.1", "quote", one).await);
        assert!(!limiter.allow("10.0.0.1", "quote", one).await);
        assert!(limiter.allow("10.0.0.1", "subscribe", one).await);
        assert!(limiter.allow("10.0.0.2", "quote", one).await);
    }

    #[tokio::test]
    async fn test_prune_is_global() {
        let (limiter, store, clock) = limiter_at(1_000);

        assert!(limiter.allow("10.0.0.1", "quote", LIMIT).await);
        assert!(limiter.allow("10.0.0.2", "subscribe", LIMIT).await);
        assert_eq!(store.event_count(), 2);

        clock.advance(120);
        assert!(limiter.allow("10.0.0.3", "quote", LIMIT).await);
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_max_calls_rejects_everything() {
        let (limiter, store, _clock) = limiter_at(1_000);
        assert!(!limiter.allow("10.0.0.1", "quote", ActionLimit::new(0, 60)).await);
        assert_eq!(store.event_count(), 0);
    }

    struct BrokenStore;

    #[async_trait]
    impl Store for BrokenStore {
        async fn insert_quote(&self, _quote: &NewQuote) -> StorageResult<i64> {
            Err(StorageError::Unavailable("down".into()))
        }
        async fn insert_subscriber(&self, _email: &str, _at: i64) -> StorageResult<i64> {
            Err(StorageError::Unavailable("down".into()))
        }
        async fn subscriber_exists(&self, _email: &str) -> StorageResult<bool> {
            Err(StorageError::Unavailable("down".into()))
        }
        async fn count_recent_events(&self, _ip: &str, _action: &str, _since: i64) -> StorageResult<u64> {
            Err(StorageError::Unavailable("down".into()))
        }
        async fn prune_events(&self, _before: i64) -> StorageResult<u64> {
            Err(StorageError::Unavailable("down".into()))
        }
        async fn record_event(&self, _event: &RateLimitEvent) -> StorageResult<()> {
            Err(StorageError::Unavailable("down".into()))
        }
        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_fails_open_on_storage_error() {
        let limiter = RateLimiter::new(Arc::new(BrokenStore), Arc::new(ManualClock::new(0)));
        for _ in 0..10 {
            assert!(limiter.allow("10.0.0.1", "quote", ActionLimit::new(1, 60)).await);
        }
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
