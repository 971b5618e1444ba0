//! In-memory cache with per-entry TTL and an injected clock.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cache mapping keys to `(stored_at, value)`.
pub struct TtlCache<K, V> {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: HashMap<K, (DateTime<Utc>, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key`. Expired entries are dropped.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            None => return None,
            Some((stored_at, _)) => now - *stored_at >= self.ttl,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|(_, v)| v.clone())
    }

    /// Store `value`, dropping every entry that has already expired.
    pub fn put(&mut self, key: K, value: V) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries.retain(|_, (stored_at, _)| now - *stored_at < ttl);
        self.entries.insert(key, (now, value));
    }

    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
