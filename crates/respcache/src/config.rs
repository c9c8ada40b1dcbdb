//! Cache sizing configuration

/// Default `max_entries` for [`CacheConfig::default`]
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Sizing parameters for a [`Cache`](crate::Cache)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries (0 disables caching)
    pub max_entries: usize,

    /// Initial index size, 0 for the index default
    pub index_capacity_hint: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            index_capacity_hint: 0,
        }
    }
}
