//! Get-or-load front end: answer from the cache, fall back to the document
//! root on a miss and cache what was loaded.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use respcache::SharedCache;
use tracing::{debug, warn};

use crate::files::DocumentRoot;
use crate::mime;

/// How a request was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Body came from the cache
    Hit,
    /// Body was loaded from disk (and cached)
    Miss,
    /// No such file, or a directory; nothing cached
    NotFound,
    /// Path tried to leave the document root
    Rejected,
}

/// Summary of one served request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub outcome: Outcome,
    pub content_type: String,
    pub bytes: usize,
}

impl Served {
    fn empty(outcome: Outcome) -> Self {
        Self {
            outcome,
            content_type: "text/plain".to_owned(),
            bytes: 0,
        }
    }
}

/// Cache-fronted file server. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct ResponseCache {
    cache: SharedCache,
    root: DocumentRoot,
}

impl ResponseCache {
    pub fn new(cache: SharedCache, root: DocumentRoot) -> Self {
        Self { cache, root }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Write the body for `request_path` to `out`.
    ///
    /// Cached bodies are copied out before writing, so a slow `out` never
    /// holds the cache lock. Missing files and rejected paths are ordinary
    /// outcomes; only I/O failures are errors.
    pub fn serve<W: Write>(&self, request_path: &str, out: &mut W) -> Result<Served> {
        let key = request_path.as_bytes();

        if let Some(cached) = self.cache.get(key) {
            debug!(path = request_path, "cache hit");
            out.write_all(&cached.payload)
                .context("Failed to write cached response")?;
            return Ok(Served {
                outcome: Outcome::Hit,
                bytes: cached.payload.len(),
                content_type: cached.content_type,
            });
        }

        let path = match self.root.resolve(request_path) {
            Some(path) => path,
            None => {
                warn!(path = request_path, "rejected request path");
                return Ok(Served::empty(Outcome::Rejected));
            }
        };
        let body = match self.root.read(&path)? {
            Some(body) => body,
            None => {
                debug!(path = request_path, "not found");
                return Ok(Served::empty(Outcome::NotFound));
            }
        };

        let content_type = mime::content_type_for(&path);
        if let Err(e) = self.cache.put(key, content_type, &body) {
            warn!(path = request_path, error = %e, "serving response uncached");
        }
        debug!(path = request_path, bytes = body.len(), "cache miss, loaded from disk");

        out.write_all(&body).context("Failed to write response")?;
        Ok(Served {
            outcome: Outcome::Miss,
            content_type: content_type.to_owned(),
            bytes: body.len(),
        })
    }
}

/// Per-outcome request counts, plus bytes served per content type
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub hits: u64,
    pub misses: u64,
    pub not_found: u64,
    pub rejected: u64,
    pub bytes: u64,
    pub by_content_type: BTreeMap<String, u64>,
}

impl Tally {
    pub fn record(&mut self, served: &Served) {
        match served.outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss => self.misses += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Rejected => self.rejected += 1,
        }
        if matches!(served.outcome, Outcome::Hit | Outcome::Miss) {
            *self
                .by_content_type
                .entry(served.content_type.clone())
                .or_default() += served.bytes as u64;
        }
        self.bytes += served.bytes as u64;
    }

    pub fn merge(&mut self, other: Tally) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.not_found += other.not_found;
        self.rejected += other.rejected;
        self.bytes += other.bytes;
        for (content_type, bytes) in other.by_content_type {
            *self.by_content_type.entry(content_type).or_default() += bytes;
        }
    }

    pub fn requests(&self) -> u64 {
        self.hits + self.misses + self.not_found + self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(capacity: usize) -> (TempDir, ResponseCache) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), b"<h1>home</h1>").unwrap();
        fs::write(dir.path().join("site.css"), b"body { margin: 0 }").unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let root = DocumentRoot::new(dir.path()).unwrap();
        let front = ResponseCache::new(SharedCache::new(capacity, 0).unwrap(), root);
        (dir, front)
    }

    #[test]
    fn test_serve_miss_then_hit() {
        let (_dir, front) = fixture(4);

        let mut out = Vec::new();
        let first = front.serve("/", &mut out).unwrap();
        assert_eq!(first.outcome, Outcome::Miss);
        assert_eq!(first.content_type, "text/html");
        assert_eq!(out, b"<h1>home</h1>");

        out.clear();
        let second = front.serve("/", &mut out).unwrap();
        assert_eq!(second.outcome, Outcome::Hit);
        assert_eq!(second.content_type, "text/html");
        assert_eq!(out, b"<h1>home</h1>");
    }

    #[test]
    fn test_serve_not_found_is_not_cached() {
        let (_dir, front) = fixture(4);

        let mut out = Vec::new();
        let served = front.serve("/missing.html", &mut out).unwrap();

        assert_eq!(served.outcome, Outcome::NotFound);
        assert!(out.is_empty());
        assert!(front.cache().is_empty());
    }

    #[test]
    fn test_serve_hit_survives_file_removal() {
        let (dir, front) = fixture(4);
        let mut out = Vec::new();
        front.serve("/site.css", &mut out).unwrap();

        // No upstream invalidation: the cached copy keeps being served
        fs::remove_file(dir.path().join("site.css")).unwrap();
        out.clear();
        let served = front.serve("/site.css", &mut out).unwrap();

        assert_eq!(served.outcome, Outcome::Hit);
        assert_eq!(out, b"body { margin: 0 }");
    }

    #[test]
    fn test_serve_evicts_least_recently_used() {
        let (_dir, front) = fixture(2);
        let mut sink = std::io::sink();

        front.serve("/index.html", &mut sink).unwrap();
        front.serve("/site.css", &mut sink).unwrap();
        front.serve("/index.html", &mut sink).unwrap(); // promote
        front.serve("/logo.png", &mut sink).unwrap(); // evicts site.css

        let served = front.serve("/site.css", &mut sink).unwrap();
        assert_eq!(served.outcome, Outcome::Miss);
        assert_eq!(front.cache().stats(|s| s.evictions()), 2);
    }

    #[test]
    fn test_serve_bad_paths_do_not_stop_serving() {
        let (dir, front) = fixture(2);
        fs::create_dir(dir.path().join("docs")).unwrap();
        let mut out = Vec::new();

        let served = front.serve("/docs", &mut out).unwrap();
        assert_eq!(served.outcome, Outcome::NotFound);

        let served = front.serve("/../secret", &mut out).unwrap();
        assert_eq!(served.outcome, Outcome::Rejected);
        assert!(out.is_empty());

        let served = front.serve("/site.css", &mut out).unwrap();
        assert_eq!(served.outcome, Outcome::Miss);
        assert_eq!(out, b"body { margin: 0 }");
        assert_eq!(front.cache().len(), 1);
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        tally.record(&Served {
            outcome: Outcome::Miss,
            content_type: "text/html".into(),
            bytes: 10,
        });
        tally.record(&Served {
            outcome: Outcome::Hit,
            content_type: "text/html".into(),
            bytes: 10,
        });

        tally.record(&Served::empty(Outcome::Rejected));

        let mut total = Tally {
            not_found: 1,
            ..Tally::default()
        };
        total.merge(tally);

        assert_eq!(total.requests(), 4);
        assert_eq!(total.rejected, 1);
        assert_eq!(total.bytes, 20);
        assert_eq!(total.by_content_type.get("text/html"), Some(&20));
        assert_eq!(total.by_content_type.len(), 1);
    }
}
