//! Bounded in-memory cache with least-recently-used eviction.
//!
//! Used at two independent scopes: whole-job results keyed by the media
//! fingerprint, and translated segments keyed by the (text, language)
//! fingerprint. Each scope is its own store with its own capacity.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Size snapshot of one cache scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

/// LRU store shared read/write across all workers.
///
/// Lookups bump recency, so both `get` and `put` take the write lock; the
/// lock is held only for the map operation itself, never across computation
/// (computation-on-miss is the caller's job).
pub struct LruStore<V: Clone> {
    /// Metric label distinguishing the scopes in hit/miss counters.
    scope: &'static str,
    inner: RwLock<LruCache<String, V>>,
    max_size: usize,
}

impl<V: Clone> LruStore<V> {
    /// `max_size` of zero is clamped to one entry.
    pub fn new(scope: &'static str, max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            scope,
            inner: RwLock::new(LruCache::new(capacity)),
            max_size: capacity.get(),
        }
    }

    /// Look up by fingerprint; a hit refreshes recency.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.inner.write().get(key).cloned();
        match value {
            Some(v) => {
                metrics::counter!("cache_hits_total", "scope" => self.scope).increment(1);
                Some(v)
            }
            None => {
                metrics::counter!("cache_misses_total", "scope" => self.scope).increment(1);
                None
            }
        }
    }

    /// Insert or overwrite. At capacity a new key evicts the
    /// least-recently-accessed entry; overwriting counts as an access and
    /// never grows the store.
    pub fn put(&self, key: String, value: V) {
        let mut cache = self.inner.write();
        cache.put(key, value);
        metrics::gauge!("cache_entries", "scope" => self.scope).set(cache.len() as f64);
    }

    /// Remove one entry, returning it. Used to drop values that fail an
    /// integrity check on read.
    pub fn pop(&self, key: &str) -> Option<V> {
        let mut cache = self.inner.write();
        let removed = cache.pop(key);
        metrics::gauge!("cache_entries", "scope" => self.scope).set(cache.len() as f64);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.inner.read().len(),
            max_size: self.max_size,
        }
    }

    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear();
        metrics::gauge!("cache_entries", "scope" => self.scope).set(0.0);
    }
}
