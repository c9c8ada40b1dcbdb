//! Thread-safe wrapper around [`Cache`]
//!
//! The engine itself has no locking. Callers that share a cache take one
//! coarse mutex per cache instance; every operation (including `get`, which
//! reorders the eviction list) runs under it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::stats::CacheStats;

/// Owned copy of a cached response, safe to hold after the lock is released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Content-type tag as stored
    pub content_type: String,
    /// Response body
    pub payload: Vec<u8>,
}

impl From<&Entry> for CachedResponse {
    fn from(entry: &Entry) -> Self {
        Self {
            content_type: entry.content_type().to_owned(),
            payload: entry.payload().to_vec(),
        }
    }
}

/// Cloneable, mutex-guarded handle to a [`Cache`]
#[derive(Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<Cache>>,
}

impl SharedCache {
    /// Create a shared cache holding at most `max_size` entries
    pub fn new(max_size: usize, index_capacity_hint: usize) -> Result<Self> {
        Cache::new(max_size, index_capacity_hint).map(Self::from_cache)
    }

    /// Create a shared cache from a [`CacheConfig`]
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Cache::from_config(config).map(Self::from_cache)
    }

    /// Wrap an existing cache
    pub fn from_cache(cache: Cache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Store a response; see [`Cache::put`]
    pub fn put(&self, key: &[u8], content_type: &str, payload: &[u8]) -> Result<()> {
        self.inner.lock().put(key, content_type, payload)
    }

    /// Look up and promote `key`, copying the response out of the cache
    pub fn get(&self, key: &[u8]) -> Option<CachedResponse> {
        self.inner.lock().get(key).map(CachedResponse::from)
    }

    /// Look up and promote `key`, running `f` on the entry while the lock is
    /// held. Avoids copying the payload.
    pub fn with_entry<R>(&self, key: &[u8], f: impl FnOnce(&Entry) -> R) -> Option<R> {
        self.inner.lock().get(key).map(f)
    }

    /// Drop the entry for `key`
    pub fn remove(&self, key: &[u8]) -> bool {
        self.inner.lock().remove(key)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum number of live entries
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Run `f` against the cache statistics
    pub fn stats<R>(&self, f: impl FnOnce(&CacheStats) -> R) -> R {
        f(self.inner.lock().stats())
    }
}
