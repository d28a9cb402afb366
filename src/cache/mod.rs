//! Bounded on-disk resource cache
//!
//! Stores one file per fetched URL under a dedicated cache directory, with
//! process-wide limits on file count, total bytes, and entry age. Every
//! operation degrades silently when the store is unavailable: a failed
//! read is a miss, a failed write is "not written," and neither is ever
//! surfaced as an error to callers.
//!
//! Reads come in two modes:
//! - [`ResourceCache::read_fresh`] honors a caller-supplied max age and
//!   reports "not fresh" (miss) past it
//! - [`ResourceCache::read_any`] returns the body unconditionally, as a
//!   last resort once the network path has already failed
//!
//! Eviction runs after every write in two phases: entries older than the
//! configured max age go first, then oldest-first by modification time
//! until both the file-count and byte limits hold.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Process-wide cache limits, mutable at runtime
#[derive(Debug, Clone)]
pub struct CacheLimits {
    /// Maximum number of cached files
    pub max_files: usize,

    /// Maximum total bytes across cached files
    pub max_bytes: u64,

    /// Maximum entry age before unconditional eviction
    pub max_age: Duration,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_files: 32,
            max_bytes: 128 * 1024,
            max_age: Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// Snapshot of cache occupancy for diagnostics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub files: usize,
    pub bytes: u64,
    pub oldest: Option<DateTime<Utc>>,
}

/// Derive the cache file name for a URL.
///
/// The scheme separator collapses to `__` and reserved path characters
/// become `_`, so the result is a single flat, deterministic file name.
pub fn sanitize_key(url: &str) -> String {
    let mut key = url.replacen("://", "__", 1);
    key = key
        .chars()
        .map(|c| match c {
            '/' | '?' | ':' | '&' | '=' | '%' | '#' => '_',
            other => other,
        })
        .collect();
    key
}

/// File-backed resource cache
pub struct ResourceCache {
    dir: PathBuf,
    limits: CacheLimits,
    flush_on_boot: bool,
    ready: Option<bool>,
}

impl ResourceCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// first use; creation failure makes every operation a silent miss.
    pub fn new(dir: impl Into<PathBuf>, limits: CacheLimits) -> Self {
        Self {
            dir: dir.into(),
            limits,
            flush_on_boot: false,
            ready: None,
        }
    }

    /// Update limits. A zero value keeps the corresponding previous limit.
    pub fn set_limits(&mut self, max_files: usize, max_bytes: u64, max_age: Duration) {
        if max_files > 0 {
            self.limits.max_files = max_files;
        }
        if max_bytes > 0 {
            self.limits.max_bytes = max_bytes;
        }
        if !max_age.is_zero() {
            self.limits.max_age = max_age;
        }
    }

    /// Current limits
    pub fn limits(&self) -> &CacheLimits {
        &self.limits
    }

    /// Clear the cache directory the next time the store is first touched.
    pub fn set_flush_on_boot(&mut self, enable: bool) {
        self.flush_on_boot = enable;
    }

    /// Remove every cached entry immediately.
    pub fn flush_now(&mut self) {
        if !self.ensure_ready() {
            return;
        }
        for (path, _, _) in self.list_entries() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "cache flush: remove failed");
            }
        }
        debug!(dir = %self.dir.display(), "cache flushed");
    }

    /// Store `body` for `url`, then prune. Returns false when the store is
    /// unavailable or the write failed; callers treat that as "not cached."
    pub fn write(&mut self, url: &str, body: &str) -> bool {
        if !self.ensure_ready() {
            return false;
        }
        let path = self.key_path(url);
        match fs::write(&path, body) {
            Ok(()) => {
                self.prune();
                true
            }
            Err(e) => {
                warn!(url, error = %e, "cache write failed");
                false
            }
        }
    }

    /// Read the body for `url` if its entry is no older than `max_age`.
    ///
    /// Ages are compared at millisecond granularity, so an entry written
    /// and read back within the same millisecond is fresh even at max age
    /// zero.
    pub fn read_fresh(&mut self, url: &str, max_age: Duration) -> Option<String> {
        let (body, age) = self.read_entry(url)?;
        if age.as_millis() <= max_age.as_millis() {
            Some(body)
        } else {
            debug!(url, age_secs = age.as_secs(), "cache entry stale");
            None
        }
    }

    /// Read the body for `url` regardless of age. Last resort once the
    /// network path has already failed.
    pub fn read_any(&mut self, url: &str) -> Option<String> {
        self.read_entry(url).map(|(body, _)| body)
    }

    /// Occupancy snapshot, or None when the store is unavailable.
    pub fn stats(&mut self) -> Option<CacheStats> {
        if !self.ensure_ready() {
            return None;
        }
        let entries = self.list_entries();
        let bytes = entries.iter().map(|(_, _, size)| size).sum();
        let oldest = entries
            .iter()
            .map(|(_, mtime, _)| *mtime)
            .min()
            .map(DateTime::<Utc>::from);
        Some(CacheStats {
            files: entries.len(),
            bytes,
            oldest,
        })
    }

    fn read_entry(&mut self, url: &str) -> Option<(String, Duration)> {
        if !self.ensure_ready() {
            return None;
        }
        let path = self.key_path(url);
        let meta = fs::metadata(&path).ok()?;
        let mtime = meta.modified().ok()?;
        let age = SystemTime::now()
            .duration_since(mtime)
            .unwrap_or(Duration::ZERO);
        let body = fs::read_to_string(&path).ok()?;
        Some((body, age))
    }

    fn key_path(&self, url: &str) -> PathBuf {
        self.dir.join(sanitize_key(url))
    }

    /// Mount the store on first use, honoring flush-on-boot.
    fn ensure_ready(&mut self) -> bool {
        if let Some(ready) = self.ready {
            return ready;
        }
        let ready = match fs::create_dir_all(&self.dir) {
            Ok(()) => true,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cache dir unavailable");
                false
            }
        };
        self.ready = Some(ready);
        if ready && self.flush_on_boot {
            self.flush_on_boot = false;
            self.flush_now();
            debug!("cache flushed on boot");
        }
        ready
    }

    /// All cache entries as (path, mtime, size), unordered.
    fn list_entries(&self) -> Vec<(PathBuf, SystemTime, u64)> {
        let mut out = Vec::new();
        let Ok(read) = fs::read_dir(&self.dir) else {
            return out;
        };
        for entry in read.flatten() {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((path, mtime, meta.len()));
        }
        out
    }

    /// Two-phase eviction: age first, then oldest-first to capacity.
    fn prune(&mut self) {
        let now = SystemTime::now();
        let mut entries = self.list_entries();

        entries.retain(|(path, mtime, _)| {
            let too_old = now
                .duration_since(*mtime)
                .map(|age| age > self.limits.max_age)
                .unwrap_or(false);
            if too_old {
                if let Err(e) = fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "cache prune: remove failed");
                }
            }
            !too_old
        });

        let mut files = entries.len();
        let mut bytes: u64 = entries.iter().map(|(_, _, size)| size).sum();
        if files <= self.limits.max_files && bytes <= self.limits.max_bytes {
            return;
        }

        entries.sort_by_key(|(_, mtime, _)| *mtime);
        for (path, _, size) in entries {
            if files <= self.limits.max_files && bytes <= self.limits.max_bytes {
                break;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "cache prune: remove failed");
                continue;
            }
            files -= 1;
            bytes = bytes.saturating_sub(size);
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("dir", &self.dir)
            .field("limits", &self.limits)
            .field("ready", &self.ready)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(
            sanitize_key("http://host:8080/data/search.json?v=1"),
            "http__host_8080_data_search.json_v_1"
        );
    }

    #[test]
    fn test_sanitize_key_deterministic() {
        let a = sanitize_key("http://h/data/by_id/AA.json");
        let b = sanitize_key("http://h/data/by_id/AA.json");
        assert_eq!(a, b);
    }

    #[test]
    fn test_limits_zero_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ResourceCache::new(dir.path(), CacheLimits::default());
        cache.set_limits(0, 0, Duration::ZERO);
        assert_eq!(cache.limits().max_files, 32);
        assert_eq!(cache.limits().max_bytes, 128 * 1024);

        cache.set_limits(4, 0, Duration::from_secs(60));
        assert_eq!(cache.limits().max_files, 4);
        assert_eq!(cache.limits().max_bytes, 128 * 1024);
        assert_eq!(cache.limits().max_age, Duration::from_secs(60));
    }

    #[test]
    fn test_unavailable_store_is_silent_miss() {
        // A path under a regular file can never become a directory
        let file = tempfile::NamedTempFile::new().unwrap();
        let bad_dir = file.path().join("nested");
        let mut cache = ResourceCache::new(bad_dir, CacheLimits::default());

        assert!(!cache.write("http://h/a", "body"));
        assert!(cache.read_fresh("http://h/a", Duration::from_secs(60)).is_none());
        assert!(cache.read_any("http://h/a").is_none());
        assert!(cache.stats().is_none());
    }
}
