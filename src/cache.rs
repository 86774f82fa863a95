//! Per-session read cache.
//!
//! Maps absolute paths to their cached [`BlockStore`]s. The cache is a plain
//! value owned by one agent session and passed explicitly into the tool
//! facades; nothing here is process-global. An entry is served only while it
//! is valid: the file still exists, its mtime matches the stored one within
//! [`MTIME_TOLERANCE`], and the store is structurally consistent. External
//! modification is detected lazily at the next lookup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::blockstore::BlockStore;

/// Slack allowed between the stored and current file mtime, absorbing
/// filesystem timestamp granularity.
pub const MTIME_TOLERANCE: Duration = Duration::from_millis(100);

/// Path-keyed cache of decomposed files for a single session.
#[derive(Debug, Default)]
pub struct ReadCache {
    entries: HashMap<PathBuf, BlockStore>,
}

impl ReadCache {
    pub fn new() -> Self {
        ReadCache {
            entries: HashMap::new(),
        }
    }

    /// Return the cached store for `path` iff the entry exists and the
    /// validity check passes; a stale or inconsistent entry yields `None`
    /// (the entry is left in place for diagnosis, never served).
    pub fn get(&self, path: &Path) -> Option<&BlockStore> {
        let store = self.entries.get(path)?;
        if !entry_is_valid(path, store) {
            warn!(
                "[WARN] [cache] Stale or inconsistent entry for {}",
                path.display()
            );
            return None;
        }
        Some(store)
    }

    /// Store or replace the entry for `path`, stamping `read_time` with the
    /// current time and re-reading `file_mtime` from disk.
    pub fn put(&mut self, path: &Path, mut store: BlockStore) {
        store.read_time = SystemTime::now();
        if let Some(mtime) = current_mtime(path) {
            store.file_mtime = mtime;
        }
        debug!(
            "[DEBUG] [cache] Cached {} ({} blocks)",
            path.display(),
            store.len()
        );
        self.entries.insert(path.to_path_buf(), store);
    }

    /// Drop the entry for `path`, returning it if present.
    pub fn invalidate(&mut self, path: &Path) -> Option<BlockStore> {
        let removed = self.entries.remove(path);
        if removed.is_some() {
            debug!("[DEBUG] [cache] Invalidated {}", path.display());
        }
        removed
    }

    /// Re-read `file_mtime` from disk and stamp `read_time` for `path`.
    /// Called after a successful write so the writer's own mtime bump does
    /// not invalidate its cache.
    pub fn refresh_timestamps(&mut self, path: &Path) {
        if let Some(store) = self.entries.get_mut(path) {
            store.read_time = SystemTime::now();
            if let Some(mtime) = current_mtime(path) {
                store.file_mtime = mtime;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn current_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn entry_is_valid(path: &Path, store: &BlockStore) -> bool {
    if !store.is_consistent() {
        return false;
    }
    match current_mtime(path) {
        Some(current) => mtimes_match(current, store.file_mtime),
        None => false,
    }
}

/// Absolute difference within tolerance, in either direction.
fn mtimes_match(a: SystemTime, b: SystemTime) -> bool {
    let diff = match a.duration_since(b) {
        Ok(d) => d,
        Err(e) => e.duration(),
    };
    diff <= MTIME_TOLERANCE
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::blockstore::decomposer::decompose;

    fn write_and_decompose(dir: &TempDir, name: &str, text: &str) -> (PathBuf, BlockStore) {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        (path.clone(), decompose(&path, text).store)
    }

    #[test]
    fn test_put_then_get_returns_entry() {
        let dir = TempDir::new().unwrap();
        let (path, store) = write_and_decompose(&dir, "a.py", "x = 1\n");
        let mut cache = ReadCache::new();
        cache.put(&path, store);
        assert!(cache.get(&path).is_some());
    }

    #[test]
    fn test_get_unknown_path_is_none() {
        let cache = ReadCache::new();
        assert!(cache.get(Path::new("/no/such/file.py")).is_none());
    }

    #[test]
    fn test_stale_mtime_invalidates() {
        let dir = TempDir::new().unwrap();
        let (path, mut store) = write_and_decompose(&dir, "a.py", "x = 1\n");
        store.file_mtime = SystemTime::now() - Duration::from_secs(100);
        let mut cache = ReadCache::new();
        // Insert directly so put's refresh does not repair the timestamp.
        cache.entries.insert(path.clone(), store);
        assert!(cache.get(&path).is_none());
    }

    #[test]
    fn test_deleted_file_invalidates() {
        let dir = TempDir::new().unwrap();
        let (path, store) = write_and_decompose(&dir, "a.py", "x = 1\n");
        let mut cache = ReadCache::new();
        cache.put(&path, store);
        fs::remove_file(&path).unwrap();
        assert!(cache.get(&path).is_none());
    }

    #[test]
    fn test_inconsistent_store_invalidates() {
        let dir = TempDir::new().unwrap();
        let (path, mut store) = write_and_decompose(&dir, "a.py", "x = 1\n");
        store.id_list.push("block-9".to_string());
        let mut cache = ReadCache::new();
        cache.put(&path, store);
        assert!(cache.get(&path).is_none());
    }

    #[test]
    fn test_refresh_timestamps_revalidates_after_write() {
        let dir = TempDir::new().unwrap();
        let (path, mut store) = write_and_decompose(&dir, "a.py", "x = 1\n");
        store.file_mtime = SystemTime::now() - Duration::from_secs(100);
        let mut cache = ReadCache::new();
        cache.entries.insert(path.clone(), store);
        assert!(cache.get(&path).is_none());
        cache.refresh_timestamps(&path);
        assert!(cache.get(&path).is_some());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let dir = TempDir::new().unwrap();
        let (path, store) = write_and_decompose(&dir, "a.py", "x = 1\n");
        let mut cache = ReadCache::new();
        cache.put(&path, store);
        assert!(cache.invalidate(&path).is_some());
        assert!(cache.get(&path).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_mtime_tolerance_window() {
        let now = SystemTime::now();
        assert!(mtimes_match(now, now));
        assert!(mtimes_match(now, now - Duration::from_millis(50)));
        assert!(mtimes_match(now - Duration::from_millis(50), now));
        assert!(!mtimes_match(now, now - Duration::from_millis(200)));
    }
}
