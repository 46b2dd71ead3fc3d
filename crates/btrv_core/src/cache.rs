//! Bounded least-recently-used cache for decoded records.
//!
//! The decoder never consults it; it is offered to layers that look up the
//! same records repeatedly. Single-owner: wrap it in a lock to share it.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// LRU map with a fixed capacity.
#[derive(Debug)]
pub struct RecordCache<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq, V> RecordCache<K, V> {
    /// Creates a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(capacity),
        }
    }

    /// Returns the value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns the value for `key` without touching recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.inner.peek(key)
    }

    /// Inserts `value` under `key`.
    ///
    /// Returns the entry displaced by the insert: the previous value for
    /// `key`, or the least recently used entry if the cache was full.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.inner.push(key, value)
    }

    /// Removes and returns the value for `key`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    /// True if `key` is cached. Does not touch recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// The most recently used entry.
    #[must_use]
    pub fn most_recently_used(&self) -> Option<(&K, &V)> {
        self.inner.iter().next()
    }

    /// The entry that the next insert into a full cache evicts.
    #[must_use]
    pub fn least_recently_used(&self) -> Option<(&K, &V)> {
        self.inner.peek_lru()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
