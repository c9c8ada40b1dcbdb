//! Settings for the replay front end
//!
//! Values come from an optional JSON file; command-line flags override them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use respcache::{CacheConfig, DEFAULT_MAX_ENTRIES};
use serde::Deserialize;

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory files are served from
    pub root: PathBuf,
    /// Maximum number of cached responses
    pub capacity: usize,
    /// Initial index size, 0 for the library default
    pub index_capacity_hint: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./public"),
            capacity: DEFAULT_MAX_ENTRIES,
            index_capacity_hint: 0,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply command-line overrides on top of file/default values
    pub fn with_overrides(
        mut self,
        root: Option<PathBuf>,
        capacity: Option<usize>,
        index_capacity_hint: Option<usize>,
    ) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        if let Some(capacity) = capacity {
            self.capacity = capacity;
        }
        if let Some(hint) = index_capacity_hint {
            self.index_capacity_hint = hint;
        }
        self
    }

    /// Cache sizing derived from these settings
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.capacity,
            index_capacity_hint: self.index_capacity_hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rcache.json");
        fs::write(&path, r#"{ "capacity": 32 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.capacity, 32);
        assert_eq!(settings.root, PathBuf::from("./public"));
        assert_eq!(settings.index_capacity_hint, 0);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rcache.json");
        fs::write(&path, r#"{ "capacty": 32 }"#).unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::default().with_overrides(Some(PathBuf::from("/srv/www")), Some(8), None);

        assert_eq!(settings.root, PathBuf::from("/srv/www"));
        assert_eq!(
            settings.cache_config(),
            CacheConfig {
                max_entries: 8,
                index_capacity_hint: 0,
            }
        );
    }
}
