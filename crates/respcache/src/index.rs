//! Key → entry index
//!
//! The cache only needs a small capability set from its index: insert (or
//! overwrite), lookup, delete and clear, all O(1) expected time. Values are
//! [`Handle`]s into the eviction list, so dropping an index never drops
//! entries.

use std::collections::HashMap;
use std::hash::BuildHasher;

use ahash::RandomState;

use crate::error::{Error, Result};
use crate::list::Handle;

/// Bucket count used when the caller passes a capacity hint of 0
pub const DEFAULT_INDEX_CAPACITY: usize = 128;

/// Associative index contract required by [`Cache`](crate::Cache)
pub trait KeyIndex {
    /// Map `key` to `handle`, returning the handle it replaced.
    ///
    /// On error the existing mapping for `key` must be left unchanged.
    fn insert(&mut self, key: &[u8], handle: Handle) -> Result<Option<Handle>>;

    /// Handle stored for `key`
    fn lookup(&self, key: &[u8]) -> Option<Handle>;

    /// Remove the mapping for `key`; `None` if it was absent
    fn delete(&mut self, key: &[u8]) -> Option<Handle>;

    /// Number of mapped keys
    fn len(&self) -> usize;

    /// Check if no keys are mapped
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every mapping
    fn clear(&mut self);
}

/// Hash-table index, keyed by an owned copy of the resource path
pub struct HashIndex<S = RandomState> {
    map: HashMap<Box<[u8]>, Handle, S>,
}

impl HashIndex<RandomState> {
    /// Create an index sized for `capacity_hint` keys (0 → default)
    ///
    /// # Errors
    /// [`Error::Allocation`] if the table cannot be reserved up front.
    pub fn with_capacity(capacity_hint: usize) -> Result<Self> {
        Self::with_hasher(capacity_hint, RandomState::new())
    }
}

impl<S: BuildHasher> HashIndex<S> {
    /// Create an index with a caller-supplied hash function
    ///
    /// # Errors
    /// [`Error::Allocation`] if the table cannot be reserved up front.
    pub fn with_hasher(capacity_hint: usize, hasher: S) -> Result<Self> {
        let capacity = if capacity_hint == 0 {
            DEFAULT_INDEX_CAPACITY
        } else {
            capacity_hint
        };

        let mut map = HashMap::with_hasher(hasher);
        map.try_reserve(capacity)
            .map_err(Error::alloc("index slots", capacity))?;

        Ok(Self { map })
    }
}

/// Empty index that grows on first insert
impl Default for HashIndex<RandomState> {
    fn default() -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
        }
    }
}

impl<S: BuildHasher> KeyIndex for HashIndex<S> {
    fn insert(&mut self, key: &[u8], handle: Handle) -> Result<Option<Handle>> {
        if let Some(slot) = self.map.get_mut(key) {
            return Ok(Some(std::mem::replace(slot, handle)));
        }

        self.map
            .try_reserve(1)
            .map_err(Error::alloc("index slot", 1))?;

        let mut owned = Vec::new();
        owned
            .try_reserve_exact(key.len())
            .map_err(Error::alloc("index key", key.len()))?;
        owned.extend_from_slice(key);

        self.map.insert(owned.into_boxed_slice(), handle);
        Ok(None)
    }

    fn lookup(&self, key: &[u8]) -> Option<Handle> {
        self.map.get(key).copied()
    }

    fn delete(&mut self, key: &[u8]) -> Option<Handle> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}
