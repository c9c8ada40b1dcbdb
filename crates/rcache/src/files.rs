//! Document root file loading

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

/// File served for directory requests
const INDEX_FILE: &str = "index.html";

/// Directory that request paths are resolved against
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    root: PathBuf,
}

impl DocumentRoot {
    /// Open a document root; it must be an existing directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            bail!("Document root {} is not a directory", root.display());
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Map a request path onto a file under the root.
    ///
    /// Only plain path segments are accepted; `..`, a leading `.` and
    /// prefixes yield `None` so requests cannot leave the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.trim_start_matches('/');
        let mut path = self.root.clone();

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => path.push(segment),
                _ => return None,
            }
        }

        if relative.is_empty() || relative.ends_with('/') {
            path.push(INDEX_FILE);
        }
        Some(path)
    }

    /// Read a resolved file. `None` if it does not exist or is a directory.
    pub fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => return Ok(None),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", path.display()))
            }
        }

        match fs::read(path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_plain_and_index() {
        let dir = TempDir::new().unwrap();
        let root = DocumentRoot::new(dir.path()).unwrap();

        assert_eq!(root.resolve("/css/site.css"), Some(dir.path().join("css/site.css")));
        assert_eq!(root.resolve("/"), Some(dir.path().join("index.html")));
        assert_eq!(root.resolve("/docs/"), Some(dir.path().join("docs/index.html")));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let root = DocumentRoot::new(dir.path()).unwrap();

        assert_eq!(root.resolve("/../etc/passwd"), None);
        assert_eq!(root.resolve("/./a"), None);
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let root = DocumentRoot::new(dir.path()).unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello").unwrap();

        let found = root.read(&root.resolve("/hello.txt").unwrap()).unwrap();
        assert_eq!(found, Some(b"hello".to_vec()));
        assert_eq!(root.read(&root.resolve("/missing.txt").unwrap()).unwrap(), None);
    }

    #[test]
    fn test_read_directory_is_none() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        let root = DocumentRoot::new(dir.path()).unwrap();

        assert_eq!(root.read(&root.resolve("/docs").unwrap()).unwrap(), None);
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();

        assert!(DocumentRoot::new(&file).is_err());
        assert!(DocumentRoot::new(dir.path().join("absent")).is_err());
    }
}
