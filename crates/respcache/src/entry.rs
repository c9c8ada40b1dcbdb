//! Cache entry record

use crate::error::{Error, Result};
use crate::list::Handle;

/// One cached response: owned copies of the key, content type and payload,
/// plus the recency links used by the eviction list.
///
/// Entries are only ever created by [`Cache::put`](crate::Cache::put) and are
/// dropped exactly once, by the eviction list that owns them.
#[derive(Debug)]
pub struct Entry {
    key: Box<[u8]>,
    content_type: Box<str>,
    payload: Box<[u8]>,
    pub(crate) prev: Option<Handle>,
    pub(crate) next: Option<Handle>,
}

impl Entry {
    /// Deep-copy the inputs into a new, unlinked entry.
    ///
    /// Every buffer is reserved fallibly; if any reservation fails the
    /// partially built entry is dropped and nothing escapes.
    pub(crate) fn new(key: &[u8], content_type: &str, payload: &[u8]) -> Result<Self> {
        Ok(Self {
            key: copy_bytes(key, "entry key")?,
            content_type: copy_str(content_type)?,
            payload: copy_bytes(payload, "entry payload")?,
            prev: None,
            next: None,
        })
    }

    /// Resource path this entry is stored under
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Content-type tag, returned exactly as stored
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Cached response body
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the cached body in bytes
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

fn copy_bytes(src: &[u8], what: &'static str) -> Result<Box<[u8]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(src.len())
        .map_err(Error::alloc(what, src.len()))?;
    buf.extend_from_slice(src);
    Ok(buf.into_boxed_slice())
}

fn copy_str(src: &str) -> Result<Box<str>> {
    let mut buf = String::new();
    buf.try_reserve_exact(src.len())
        .map_err(Error::alloc("entry content type", src.len()))?;
    buf.push_str(src);
    Ok(buf.into_boxed_str())
}
