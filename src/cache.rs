//! # TTL Cache
//!
//! Small time-bounded cache for read-mostly admin statistics.
//! Expired entries are dropped lazily on access.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    /// `None` when the TTL is too large to represent
    expires_at: Option<Instant>,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value for `key` if it has not expired
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        let now = Instant::now();
        let expired = entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|expires_at| expires_at <= now);
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                Entry {
                    value,
                    expires_at: Instant::now().checked_add(ttl),
                },
            );
        }
    }

    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of stored entries, expired ones included until touched
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_should_return_fresh_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("stats", 42);

        assert_eq!(cache.get(&"stats"), Some(42));
        assert_eq!(cache.get(&"other"), None);
    }

    #[test]
    fn cache_should_evict_expired_entries_on_access() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert_with_ttl("stats", 1, Duration::ZERO);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"stats"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_should_invalidate_and_clear() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);

        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn huge_ttl_should_never_expire() {
        let cache = TtlCache::new(Duration::MAX);
        cache.insert("stats", 7);

        assert_eq!(cache.get(&"stats"), Some(7));
    }
}
