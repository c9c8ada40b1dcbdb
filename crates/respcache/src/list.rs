//! Recency-ordered eviction list
//!
//! Entries live in an arena of slots (`Vec<Option<Entry>>` plus a free list)
//! and are linked by slot handles rather than pointers. The list is the sole
//! owner of every entry; the index only stores handles.
//!
//! Head is the most recently used entry, tail the least recently used.

use std::fmt;

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Stable reference to a live entry in the eviction list arena
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Doubly-linked MRU → LRU ordering of all live entries
#[derive(Default)]
pub struct EvictionList {
    slots: Vec<Option<Entry>>,
    free_list: Vec<usize>,
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
}

impl EvictionList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the entry behind a handle
    ///
    /// # Panics
    /// If `handle` does not name a live entry.
    pub fn get(&self, handle: Handle) -> &Entry {
        self.node(handle)
    }

    /// Make sure the next `additional` inserts cannot allocate.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let grow = additional.saturating_sub(self.free_list.len());
        if grow == 0 {
            return Ok(());
        }

        self.slots
            .try_reserve(grow)
            .map_err(Error::alloc("eviction list slots", grow))?;

        // Removing every slot must be able to record it as free
        let free_needed = self.slots.len() + grow - self.free_list.len();
        self.free_list
            .try_reserve(free_needed)
            .map_err(Error::alloc("eviction list free slots", free_needed))
    }

    /// Link `entry` as the new head and return its handle. O(1).
    pub fn insert_at_head(&mut self, mut entry: Entry) -> Handle {
        entry.prev = None;
        entry.next = self.head;

        let handle = self.alloc_slot(entry);

        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
        self.len += 1;

        handle
    }

    /// Promote an entry to the head. O(1), no-op if it already is the head.
    pub fn move_to_head(&mut self, handle: Handle) {
        if self.head == Some(handle) {
            return;
        }

        let (prev, next) = {
            let node = self.node(handle);
            (node.prev, node.next)
        };

        // Not the head, so there is always a predecessor
        let prev = match prev {
            Some(prev) => prev,
            None => panic!("{:?} is not linked into the eviction list", handle),
        };

        if self.tail == Some(handle) {
            self.tail = Some(prev);
            self.node_mut(prev).next = None;
        } else if let Some(next) = next {
            self.node_mut(prev).next = Some(next);
            self.node_mut(next).prev = Some(prev);
        }

        let old_head = self.head;
        {
            let node = self.node_mut(handle);
            node.prev = None;
            node.next = old_head;
        }
        if let Some(old_head) = old_head {
            self.node_mut(old_head).prev = Some(handle);
        }
        self.head = Some(handle);
    }

    /// Detach the least recently used entry and hand it to the caller. O(1).
    ///
    /// The entry is not dropped here; the caller either drops it or relinks it.
    ///
    /// # Panics
    /// If the list is empty. Callers check `len()` first.
    pub fn remove_tail(&mut self) -> Entry {
        let old_tail = match self.tail {
            Some(tail) => tail,
            None => panic!("remove_tail called on an empty eviction list"),
        };

        let new_tail = self.node(old_tail).prev;
        self.tail = new_tail;
        match new_tail {
            Some(new_tail) => self.node_mut(new_tail).next = None,
            None => self.head = None,
        }

        self.take_slot(old_tail)
    }

    /// Detach an arbitrary entry. O(1).
    ///
    /// # Panics
    /// If `handle` does not name a live entry.
    pub fn remove(&mut self, handle: Handle) -> Entry {
        let (prev, next) = {
            let node = self.node(handle);
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }

        self.take_slot(handle)
    }

    /// Iterate from most to least recently used
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Drop every entry, walking head to tail. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        let mut cursor = self.head;

        while let Some(handle) = cursor {
            cursor = self.node(handle).next;
            drop(self.take_slot(handle));
            released += 1;
        }

        self.clear();
        released
    }

    /// Forget all entries and slots
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn alloc_slot(&mut self, entry: Entry) -> Handle {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(entry);
            Handle(idx)
        } else {
            let idx = self.slots.len();
            self.slots.push(Some(entry));
            Handle(idx)
        }
    }

    fn take_slot(&mut self, handle: Handle) -> Entry {
        let mut entry = match self.slots.get_mut(handle.0).and_then(Option::take) {
            Some(entry) => entry,
            None => panic!("{:?} does not name a live entry", handle),
        };
        self.free_list.push(handle.0);
        self.len -= 1;

        entry.prev = None;
        entry.next = None;
        entry
    }

    fn node(&self, handle: Handle) -> &Entry {
        match self.slots.get(handle.0) {
            Some(Some(entry)) => entry,
            _ => panic!("{:?} does not name a live entry", handle),
        }
    }

    fn node_mut(&mut self, handle: Handle) -> &mut Entry {
        match self.slots.get_mut(handle.0) {
            Some(Some(entry)) => entry,
            _ => panic!("{:?} does not name a live entry", handle),
        }
    }

    /// Assert the chain is well formed and head/tail agree with `len`.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        match (self.head, self.tail) {
            (None, None) => assert_eq!(self.len, 0, "empty list with nonzero len"),
            (Some(head), Some(tail)) => {
                assert!(self.node(head).prev.is_none(), "head has a predecessor");
                assert!(self.node(tail).next.is_none(), "tail has a successor");
                assert_eq!(head == tail, self.len == 1, "head/tail identity vs len");
            }
            _ => panic!("head and tail disagree about emptiness"),
        }

        let mut walked = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(handle) = cursor {
            let node = self.node(handle);
            assert_eq!(node.prev, prev, "broken back link at {:?}", handle);
            prev = Some(handle);
            cursor = node.next;
            walked += 1;
            assert!(walked <= self.len, "cycle in eviction list");
        }
        assert_eq!(prev, self.tail, "forward walk did not end at tail");
        assert_eq!(walked, self.len);

        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, self.len, "orphaned entries in arena");
    }
}

/// Iterator over `(handle, entry)` pairs from head to tail
pub struct Iter<'a> {
    list: &'a EvictionList,
    cursor: Option<Handle>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Handle, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let entry = self.list.node(handle);
        self.cursor = entry.next;
        Some((handle, entry))
    }
}
