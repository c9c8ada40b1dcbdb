//! LRU cache façade over the index and eviction list

use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::index::{HashIndex, KeyIndex};
use crate::list::EvictionList;
use crate::stats::CacheStats;

/// Fixed-capacity cache of response bodies keyed by resource path
///
/// Single-threaded: every operation takes `&mut self`, so callers that share
/// a cache between threads go through [`SharedCache`](crate::SharedCache).
pub struct Cache<I: KeyIndex = HashIndex> {
    /// Key → handle lookup, never consulted for entry lifetimes
    index: I,

    /// Owns every live entry, MRU at the head
    list: EvictionList,

    /// Maximum number of live entries
    max_size: usize,

    stats: CacheStats,
}

impl Cache<HashIndex> {
    /// Create a cache holding at most `max_size` entries
    ///
    /// # Arguments
    /// * `max_size` - Capacity; 0 is accepted and keeps the cache empty
    /// * `index_capacity_hint` - Initial index size, 0 for the default
    ///
    /// # Returns
    /// * `Result<Cache>` - `Error::Allocation` if the index cannot be reserved
    pub fn new(max_size: usize, index_capacity_hint: usize) -> Result<Self> {
        let index = HashIndex::with_capacity(index_capacity_hint)?;
        Ok(Self::with_index(max_size, index))
    }

    /// Create a cache from a [`CacheConfig`]
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.max_entries, config.index_capacity_hint)
    }
}

impl<I: KeyIndex> Cache<I> {
    /// Create a cache over a caller-supplied index
    pub fn with_index(max_size: usize, index: I) -> Self {
        debug!(max_size, "creating response cache");

        Self {
            index,
            list: EvictionList::new(),
            max_size,
            stats: CacheStats::new(),
        }
    }

    /// Store a response under `key`, evicting the least recently used entry
    /// if the cache grows past capacity.
    ///
    /// If `key` is already cached, the old entry is dropped and replaced by
    /// the new one, which becomes the most recently used. Keys are therefore
    /// unique among live entries.
    ///
    /// # Errors
    /// [`Error::Allocation`](crate::Error::Allocation) if the entry or its
    /// list/index slots cannot be allocated. The cache is left exactly as it
    /// was, including any previous entry for `key`.
    pub fn put(&mut self, key: &[u8], content_type: &str, payload: &[u8]) -> Result<()> {
        let entry = Entry::new(key, content_type, payload)?;
        self.list.reserve(1)?;

        let handle = self.list.insert_at_head(entry);
        match self.index.insert(key, handle) {
            Ok(Some(stale)) => {
                drop(self.list.remove(stale));
                self.stats.record_replacement();
                trace!(key = %String::from_utf8_lossy(key), "replaced cached entry");
            }
            Ok(None) => {}
            Err(e) => {
                drop(self.list.remove(handle));
                return Err(e);
            }
        }
        self.stats.record_insert();

        while self.list.len() > self.max_size {
            self.evict_lru();
        }

        Ok(())
    }

    /// Look up `key` and promote it to most recently used
    ///
    /// The returned entry borrows the cache, so it cannot be held across the
    /// next mutating call.
    pub fn get(&mut self, key: &[u8]) -> Option<&Entry> {
        let handle = match self.index.lookup(key) {
            Some(handle) => handle,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        self.list.move_to_head(handle);
        self.stats.record_hit();
        Some(self.list.get(handle))
    }

    /// Look up `key` without touching recency or statistics
    pub fn peek(&self, key: &[u8]) -> Option<&Entry> {
        self.index.lookup(key).map(|handle| self.list.get(handle))
    }

    /// Check if `key` is cached
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.lookup(key).is_some()
    }

    /// Drop the entry for `key`. Returns whether one was cached.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        match self.index.delete(key) {
            Some(handle) => {
                drop(self.list.remove(handle));
                true
            }
            None => false,
        }
    }

    /// Drop every entry (capacity and statistics are kept)
    pub fn clear(&mut self) {
        self.index.clear();
        let released = self.list.release_all();
        debug!(released, "cache cleared");
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Maximum number of live entries
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Hit/miss/eviction counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.list.iter().map(|(_, entry)| entry)
    }

    /// Tear the cache down: drop the index, then every entry from head to
    /// tail. Returns the number of entries released.
    pub fn destroy(self) -> usize {
        let Cache {
            index, mut list, ..
        } = self;

        drop(index);
        let released = list.release_all();
        debug!(released, "cache destroyed");
        released
    }

    fn evict_lru(&mut self) {
        let victim = self.list.remove_tail();
        self.index.delete(victim.key());
        self.stats.record_eviction();
        trace!(key = %String::from_utf8_lossy(victim.key()), "evicted least recently used entry");
    }

    /// Assert list shape, and list/index agreement on every key.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.list.assert_invariants();
        assert_eq!(self.index.len(), self.list.len(), "index/list size mismatch");

        for (handle, entry) in self.list.iter() {
            assert_eq!(
                self.index.lookup(entry.key()),
                Some(handle),
                "index does not point at live entry for {:?}",
                String::from_utf8_lossy(entry.key())
            );
        }
    }
}
