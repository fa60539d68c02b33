//! TTL-bounded read-through cache for haven resource records.
//!
//! The cache fronts the resource store to absorb read load. It is purely
//! derived state: every entry can be rebuilt from the store, population is
//! advisory, and an entry may lag the store by at most its TTL. Callers
//! populate it around store reads (cache-aside) and refresh or evict the key
//! on every successful mutation, so a cold cache is observationally
//! identical to a warm one.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use haven_cache::TtlCache;
//!
//! let cache: TtlCache<String, u64> = TtlCache::new();
//! cache.put("balance".to_string(), 42, Duration::from_secs(60));
//!
//! assert_eq!(cache.get(&"balance".to_string()), Some(42));
//! cache.evict(&"balance".to_string());
//! assert_eq!(cache.get(&"balance".to_string()), None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// A cached value and its expiry deadline.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// A concurrent map whose entries expire after a per-entry TTL.
///
/// Expired entries read as misses; they are lazily dropped on write and via
/// [`TtlCache::purge_expired`]. Values are stored and returned by clone, so
/// readers never observe a record mid-mutation.
#[derive(Debug, Default)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cached value for `key`, if present and unexpired.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Insert or replace the value for `key`, valid for `ttl`.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key, entry);
    }

    /// Remove the entry for `key`, returning the value if it was live.
    pub fn evict(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries
            .write()
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
    }

    /// Check whether `key` has a live entry.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Check whether the cache has no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drop expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}
