//! # respcache
//!
//! Fixed-capacity LRU cache for response bodies, keyed by resource path.
//!
//! ## Architecture
//! - **Index**: AHash map from key to entry handle (O(1))
//! - **Eviction list**: arena-backed doubly-linked list, MRU at the head (O(1))
//! - **Cache**: keeps both consistent and enforces capacity on every `put`
//!
//! The engine is single-threaded; [`SharedCache`] adds one mutex per cache for
//! callers that need to share it.
//!
//! ```
//! use respcache::Cache;
//!
//! let mut cache = Cache::new(2, 0)?;
//! cache.put(b"/index.html", "text/html", b"<h1>hi</h1>")?;
//!
//! let entry = cache.get(b"/index.html").unwrap();
//! assert_eq!(entry.content_type(), "text/html");
//! # Ok::<(), respcache::Error>(())
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod entry;
mod error;
mod index;
mod list;
mod shared;
mod stats;

pub use cache::Cache;
pub use config::{CacheConfig, DEFAULT_MAX_ENTRIES};
pub use entry::Entry;
pub use error::{Error, Result};
pub use index::{HashIndex, KeyIndex, DEFAULT_INDEX_CAPACITY};
pub use list::Handle;
pub use shared::{CachedResponse, SharedCache};
pub use stats::CacheStats;
