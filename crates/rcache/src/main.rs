//! rcache - replay file requests through a respcache LRU cache

mod config;
mod files;
mod mime;
mod server;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use respcache::SharedCache;
use tracing::{error, info};

use crate::config::Settings;
use crate::files::DocumentRoot;
use crate::server::{ResponseCache, Tally};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File listing request paths, one per line ('#' starts a comment)
    requests: PathBuf,

    /// Document root to serve files from
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Cache capacity (number of responses)
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Initial index size (0 for default)
    #[arg(long)]
    index_hint: Option<usize>,

    /// JSON settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of passes over the request list
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Worker threads sharing the cache
    #[arg(short, long, default_value_t = 1)]
    workers: usize,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if args.workers == 0 {
        bail!("--workers must be at least 1");
    }

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .with_overrides(args.root.clone(), args.capacity, args.index_hint);

    info!("Starting rcache v{}", env!("CARGO_PKG_VERSION"));
    info!("Document root: {}", settings.root.display());
    info!("Cache capacity: {}", settings.capacity);

    let root = DocumentRoot::new(&settings.root)?;
    let cache = SharedCache::from_config(&settings.cache_config())
        .context("Failed to create response cache")?;
    let front = ResponseCache::new(cache, root);

    let requests = load_requests(&args.requests)?;
    info!("Replaying {} requests x{} on {} workers", requests.len(), args.repeat, args.workers);

    let started = Instant::now();
    let tally = replay(&front, &requests, args.repeat, args.workers)?;
    let elapsed = started.elapsed();

    let cache = front.cache();
    let (evictions, replacements, hit_ratio) =
        cache.stats(|s| (s.evictions(), s.replacements(), s.hit_ratio()));

    info!("Replay finished in {:?}", elapsed);
    println!("\nrcache summary");
    println!("   Requests:      {}", tally.requests());
    println!("   Hits:          {}", tally.hits);
    println!("   Misses:        {}", tally.misses);
    println!("   Not found:     {}", tally.not_found);
    println!("   Rejected:      {}", tally.rejected);
    println!("   Bytes served:  {}", tally.bytes);
    println!("   Evictions:     {}", evictions);
    println!("   Replacements:  {}", replacements);
    println!("   Hit ratio:     {:.2}", hit_ratio);
    println!("   Cached:        {}/{}", cache.len(), cache.capacity());
    for (content_type, bytes) in &tally.by_content_type {
        println!("   {:<24} {} bytes", content_type, bytes);
    }

    Ok(())
}

/// Read request paths, skipping blank lines and comments
fn load_requests(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request list {}", path.display()))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

/// Serve every request `repeat` times, striping the list across workers
fn replay(front: &ResponseCache, requests: &[String], repeat: usize, workers: usize) -> Result<Tally> {
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let front = front.clone();
                scope.spawn(move || -> Result<Tally> {
                    let mut tally = Tally::default();
                    let mut sink = io::sink();

                    for _ in 0..repeat {
                        for path in requests.iter().skip(worker).step_by(workers) {
                            let served = front.serve(path, &mut sink)?;
                            tally.record(&served);
                        }
                    }
                    Ok(tally)
                })
            })
            .collect();

        let mut total = Tally::default();
        for handle in handles {
            match handle.join() {
                Ok(result) => total.merge(result?),
                Err(_) => {
                    error!("Replay worker panicked");
                    bail!("replay worker panicked");
                }
            }
        }
        Ok(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_requests_skips_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requests.txt");
        fs::write(&path, "# warmup\n/\n\n  /site.css  \n#/skipped\n").unwrap();

        assert_eq!(load_requests(&path).unwrap(), ["/", "/site.css"]);
    }

    #[test]
    fn test_replay_multiple_workers() {
        let dir = TempDir::new().unwrap();
        for name in ["a.html", "b.html", "c.html", "d.html"] {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        let front = ResponseCache::new(
            SharedCache::new(8, 0).unwrap(),
            DocumentRoot::new(dir.path()).unwrap(),
        );
        let requests: Vec<String> = ["/a.html", "/b.html", "/c.html", "/d.html", "/nope.html"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let tally = replay(&front, &requests, 3, 2).unwrap();

        // Each worker owns a disjoint stripe, so every file misses exactly once
        assert_eq!(tally.requests(), 15);
        assert_eq!(tally.misses, 4);
        assert_eq!(tally.hits, 8);
        assert_eq!(tally.not_found, 3);
        assert_eq!(front.cache().len(), 4);
        assert_eq!(tally.by_content_type.get("text/html"), Some(&(6 * 12)));
    }

    #[test]
    fn test_replay_continues_past_bad_requests() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), b"a").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        let front = ResponseCache::new(
            SharedCache::new(4, 0).unwrap(),
            DocumentRoot::new(dir.path()).unwrap(),
        );
        let requests: Vec<String> = ["/a.html", "/docs", "/../etc/passwd", "/a.html"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let tally = replay(&front, &requests, 1, 1).unwrap();

        assert_eq!(tally.misses, 1);
        assert_eq!(tally.hits, 1);
        assert_eq!(tally.not_found, 1);
        assert_eq!(tally.rejected, 1);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["rcache", "reqs.txt", "-c", "16", "--workers", "4"]).unwrap();

        assert_eq!(args.requests, PathBuf::from("reqs.txt"));
        assert_eq!(args.capacity, Some(16));
        assert_eq!(args.workers, 4);
        assert_eq!(args.repeat, 1);
        assert!(args.root.is_none());
    }
}
