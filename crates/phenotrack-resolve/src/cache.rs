//! Run-scoped concurrent cache with insert-if-absent publication
//!
//! Values are computed outside any lock; only the final publish is atomic.
//! When two tasks race on the same key the first publish wins and the
//! loser gets the winner's value back. Entries are never removed.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Values published by a winner
    pub published: u64,
    /// Publishes that lost to an earlier value
    pub lost_races: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    published: AtomicU64,
    lost_races: AtomicU64,
}

/// Concurrent key/value cache living for one run
#[derive(Debug)]
pub struct RunCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
    counters: Counters,
}

impl<K, V> Default for RunCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            counters: Counters::default(),
        }
    }
}

impl<K, V> RunCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.entries.get(key).map(|v| v.value().clone());
        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Check for a key without touching the statistics
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert if absent
    ///
    /// Returns the value now stored under `key` and whether it is the one
    /// passed in. A `false` means another writer got there first and
    /// `value` was discarded.
    pub fn publish(&self, key: K, value: V) -> (V, bool) {
        match self.entries.entry(key) {
            Entry::Occupied(existing) => {
                self.counters.lost_races.fetch_add(1, Ordering::Relaxed);
                (existing.get().clone(), false)
            }
            Entry::Vacant(slot) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                (slot.insert(value).value().clone(), true)
            }
        }
    }

    /// Get or synchronously create
    ///
    /// `f` runs under the shard lock, so it must be cheap and must not touch
    /// this cache.
    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> (V, bool) {
        if let Some(v) = self.get(&key) {
            return (v, false);
        }
        match self.entries.entry(key) {
            Entry::Occupied(existing) => {
                self.counters.lost_races.fetch_add(1, Ordering::Relaxed);
                (existing.get().clone(), false)
            }
            Entry::Vacant(slot) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                (slot.insert(f()).value().clone(), true)
            }
        }
    }

    /// Get or asynchronously create
    ///
    /// On a miss `f` runs with no lock held (it may perform remote I/O),
    /// then its value is published with [`RunCache::publish`].
    ///
    /// # Errors
    /// Propagates the error from `f`; nothing is cached in that case.
    pub async fn get_or_create<F, Fut, E>(&self, key: K, f: F) -> Result<(V, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.get(&key) {
            return Ok((v, false));
        }
        let value = f().await?;
        Ok(self.publish(key, value))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of all entries, in no particular order
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Consume the cache, yielding its entries
    #[must_use]
    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries.into_iter().collect()
    }

    /// Current statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            published: self.counters.published.load(Ordering::Relaxed),
            lost_races: self.counters.lost_races.load(Ordering::Relaxed),
        }
    }
}
