//! Process-local store.
//!
//! Holds everything in memory; contents are lost on restart. Each call runs
//! under a single lock, so the limiter's individual steps never interleave
//! with another request's step on the same table.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{
    NewQuote, RateLimitEvent, Store, StorageError, StorageResult, StoredQuote, Subscriber,
};

/// In-memory implementation of [`Store`].
#[derive(Default)]
pub struct MemoryStore {
    quotes: Mutex<Vec<StoredQuote>>,
    subscribers: DashMap<String, Subscriber>,
    events: Mutex<Vec<RateLimitEvent>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Snapshot of all stored quotes, oldest first.
    pub fn quotes(&self) -> Vec<StoredQuote> {
        self.quotes.lock().expect("quote store mutex poisoned").clone()
    }

    /// Snapshot of all subscribers, ordered by id.
    pub fn subscribers(&self) -> Vec<Subscriber> {
        let mut all: Vec<Subscriber> = self.subscribers.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|s| s.id);
        all
    }

    /// Number of rate-limit events currently retained.
    pub fn event_count(&self) -> usize {
        self.events.lock().expect("event store mutex poisoned").len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_quote(&self, quote: &NewQuote) -> StorageResult<i64> {
        let id = self.next_id();
        self.quotes
            .lock()
            .expect("quote store mutex poisoned")
            .push(StoredQuote { id, quote: quote.clone() });
        Ok(id)
    }

    async fn insert_subscriber(&self, email: &str, subscribed_at: i64) -> StorageResult<i64> {
        match self.subscribers.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Duplicate),
            Entry::Vacant(slot) => {
                let id = self.next_id();
                slot.insert(Subscriber {
                    id,
                    email: email.to_string(),
                    subscribed_at,
                });
                Ok(id)
            }
        }
    }

    async fn subscriber_exists(&self, email: &str) -> StorageResult<bool> {
        Ok(self.subscribers.contains_key(email))
    }

    async fn count_recent_events(&self, ip: &str, action: &str, since: i64) -> StorageResult<u64> {
        let events = self.events.lock().expect("event store mutex poisoned");
        let count = events
            .iter()
            .filter(|e| e.ip == ip && e.action == action && e.created_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn prune_events(&self, before: i64) -> StorageResult<u64> {
        let mut events = self.events.lock().expect("event store mutex poisoned");
        let len_before = events.len();
        events.retain(|e| e.created_at >= before);
        Ok((len_before - events.len()) as u64)
    }

    async fn record_event(&self, event: &RateLimitEvent) -> StorageResult<()> {
        self.events
            .lock()
            .expect("event store mutex poisoned")
            .push(event.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
