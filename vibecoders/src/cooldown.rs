//! Per-key cooldown cache
//!
//! Absorbs double-fired actions (a double-clicked vote button, a repeated
//! key press) by refusing the same key twice within a TTL. This is a guard
//! against redundant requests, not a lock: distinct keys never contend.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Records the last time each key fired and rejects repeats within the TTL
#[derive(Debug)]
pub struct CooldownCache<K> {
    ttl: Duration,
    entries: HashMap<K, Instant>,
}

impl<K: Eq + Hash> CooldownCache<K> {
    /// Create a cache where a key may fire at most once per `ttl`
    pub fn new(ttl: Duration) -> Self {
        CooldownCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Try to fire `key` now
    ///
    /// Returns `false` when the key fired less than the TTL ago. On success
    /// the key's timestamp is refreshed.
    pub fn try_acquire(&mut self, key: K) -> bool {
        self.acquire_at(key, Instant::now())
    }

    /// [`CooldownCache::try_acquire`] with an explicit clock, for callers
    /// (and tests) that already have a timestamp in hand
    pub fn acquire_at(&mut self, key: K, now: Instant) -> bool {
        // Expired entries are dropped as a side effect so the map does not
        // grow with every key ever seen
        self.entries
            .retain(|_, last| now.saturating_duration_since(*last) < self.ttl);

        match self.entries.get(&key) {
            Some(last) if now.saturating_duration_since(*last) < self.ttl => false,
            _ => {
                self.entries.insert(key, now);
                true
            }
        }
    }

    /// The configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_within_ttl_is_rejected() {
        let mut cache = CooldownCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(cache.acquire_at(5, t0));
        assert!(!cache.acquire_at(5, t0 + Duration::from_millis(500)));
        assert!(!cache.acquire_at(5, t0 + Duration::from_millis(999)));
    }

    #[test]
    fn repeat_after_ttl_is_accepted() {
        let mut cache = CooldownCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(cache.acquire_at(5, t0));
        assert!(cache.acquire_at(5, t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn distinct_keys_never_contend() {
        let mut cache = CooldownCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(cache.acquire_at(5, t0));
        assert!(cache.acquire_at(6, t0));
    }

    #[test]
    fn expired_entries_are_pruned() {
        let mut cache = CooldownCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        cache.acquire_at(1, t0);
        cache.acquire_at(2, t0);
        cache.acquire_at(3, t0 + Duration::from_millis(1500));
        assert_eq!(cache.entries.len(), 1);
    }
}
