//! Disk-backed tile store with mtime-based eviction.
//!
//! Every read, write and eviction pass runs under one mutex. Tile traffic is
//! small and bursty, so serialising disk access keeps the accounting exact
//! at negligible cost.
//!
//! # Layout
//!
//! ```text
//! <root>/<h[0:2]>/<h[2:4]>/<h>.tile   raw tile bytes
//! <root>/<h[0:2]>/<h[2:4]>/<h>.tmp    transient, during a write
//! ```
//!
//! A file's mtime is its "last used" time: it is touched on every read hit
//! and on write. Eviction removes the least recently used files first.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use filetime::FileTime;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::key::{TileKey, TEMP_EXTENSION};
use super::{scan_tiles, CacheError, EvictionResult};
use crate::config::TileCacheConfig;

/// Disk-backed key/value store for tile bytes.
pub struct TileCacheStore {
    root: PathBuf,
    max_size_bytes: u64,
    /// Serialises all disk access.
    io_lock: Mutex<()>,
}

impl TileCacheStore {
    /// Creates a store rooted at `root` with a byte budget.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>, max_size_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_size_bytes,
            io_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &TileCacheConfig) -> Self {
        Self::new(config.directory.clone(), config.max_size_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Reads a tile, touching its mtime on a hit.
    ///
    /// A missing file is `Ok(None)`. Unreadable entries are reported as
    /// errors; callers treat them as misses.
    pub fn get(&self, key: &TileKey) -> Result<Option<Vec<u8>>, CacheError> {
        let path = key.path_in(&self.root);
        let _io = self.io_lock.lock();

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        if let Err(e) = filetime::set_file_mtime(&path, FileTime::now()) {
            warn!(path = %path.display(), error = %e, "Failed to touch cached tile");
        }
        Ok(Some(data))
    }

    /// Checks presence without reading or touching the entry.
    pub fn contains(&self, key: &TileKey) -> bool {
        let path = key.path_in(&self.root);
        let _io = self.io_lock.lock();
        path.is_file()
    }

    /// Stores a tile atomically, then enforces the byte budget.
    ///
    /// The bytes go to a `.tmp` sibling first and are renamed over the final
    /// path, so readers never observe a partial tile. Eviction problems are
    /// logged and do not fail the write.
    pub fn put(&self, key: &TileKey, data: &[u8]) -> Result<(), CacheError> {
        let path = key.path_in(&self.root);
        let _io = self.io_lock.lock();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let temp_path = path.with_extension(TEMP_EXTENSION);
        if let Err(e) = fs::write(&temp_path, data) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&temp_path, e));
        }
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&path, e));
        }

        if let Err(e) = filetime::set_file_mtime(&path, FileTime::now()) {
            warn!(path = %path.display(), error = %e, "Failed to touch written tile");
        }
        debug!(key = %key, bytes = data.len(), "Stored tile");

        match self.evict_locked() {
            Ok(result) if result.files_deleted > 0 => info!(%result, "Evicted cached tiles"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Tile cache eviction failed"),
        }
        Ok(())
    }

    /// Runs an eviction pass on demand.
    pub fn evict(&self) -> Result<EvictionResult, CacheError> {
        let _io = self.io_lock.lock();
        self.evict_locked()
    }

    /// Total bytes of stored tiles.
    pub fn size_bytes(&self) -> Result<u64, CacheError> {
        let _io = self.io_lock.lock();
        Ok(scan_tiles(&self.root)?.iter().map(|t| t.size).sum())
    }

    /// Deletes least recently used tiles until the total is within budget.
    ///
    /// Must be called with `io_lock` held.
    fn evict_locked(&self) -> Result<EvictionResult, CacheError> {
        let start = Instant::now();
        let mut tiles = scan_tiles(&self.root)?;
        let mut total: u64 = tiles.iter().map(|t| t.size).sum();

        let mut result = EvictionResult::default();
        if total <= self.max_size_bytes {
            return Ok(result);
        }

        // Oldest first; path breaks ties so equal mtimes evict deterministically.
        tiles.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.path.cmp(&b.path))
        });

        for tile in tiles {
            if total <= self.max_size_bytes {
                break;
            }
            match fs::remove_file(&tile.path) {
                Ok(()) => {
                    total -= tile.size;
                    result.files_deleted += 1;
                    result.bytes_freed += tile.size;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    total -= tile.size;
                }
                Err(e) => {
                    result.duration_ms = start.elapsed().as_millis() as u64;
                    return Err(CacheError::io(&tile.path, e));
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

impl std::fmt::Debug for TileCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCacheStore")
            .field("root", &self.root)
            .field("max_size_bytes", &self.max_size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn key(n: u32) -> TileKey {
        TileKey::from_url(&format!("https://tiles.example/10/{}/7.png", n))
    }

    fn set_age(store: &TileCacheStore, key: &TileKey, secs_ago: u64) {
        let when = SystemTime::now() - Duration::from_secs(secs_ago);
        filetime::set_file_mtime(key.path_in(store.root()), FileTime::from_system_time(when))
            .unwrap();
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 1_000_000);
        assert!(store.get(&key(1)).unwrap().is_none());
        assert!(!store.contains(&key(1)));
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 1_000_000);

        store.put(&key(1), &[0x89, b'P', b'N', b'G']).unwrap();

        assert!(store.contains(&key(1)));
        assert_eq!(
            store.get(&key(1)).unwrap(),
            Some(vec![0x89, b'P', b'N', b'G'])
        );
        assert!(key(1).path_in(dir.path()).is_file());
    }

    #[test]
    fn test_put_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 1_000_000);
        store.put(&key(1), b"tile").unwrap();

        let temp = key(1).path_in(dir.path()).with_extension(TEMP_EXTENSION);
        assert!(!temp.exists());
    }

    #[test]
    fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 1_000_000);
        store.put(&key(1), b"old").unwrap();
        store.put(&key(1), b"new").unwrap();
        assert_eq!(store.get(&key(1)).unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_get_touches_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 1_000_000);
        store.put(&key(1), b"tile").unwrap();
        set_age(&store, &key(1), 3600);

        store.get(&key(1)).unwrap();

        let modified = fs::metadata(key(1).path_in(dir.path()))
            .unwrap()
            .modified()
            .unwrap();
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        assert!(age < Duration::from_secs(60), "mtime not refreshed: {:?}", age);
    }

    #[test]
    fn test_eviction_removes_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 300);

        store.put(&key(1), &[1; 100]).unwrap();
        store.put(&key(2), &[2; 100]).unwrap();
        store.put(&key(3), &[3; 100]).unwrap();
        set_age(&store, &key(1), 300);
        set_age(&store, &key(2), 100);
        set_age(&store, &key(3), 200);

        store.put(&key(4), &[4; 100]).unwrap();

        assert!(!store.contains(&key(1)), "oldest entry should be evicted");
        assert!(store.contains(&key(2)));
        assert!(store.contains(&key(3)));
        assert!(store.contains(&key(4)));
        assert!(store.size_bytes().unwrap() <= 300);
    }

    #[test]
    fn test_read_hit_protects_from_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 200);

        store.put(&key(1), &[1; 100]).unwrap();
        store.put(&key(2), &[2; 100]).unwrap();
        set_age(&store, &key(1), 500);
        set_age(&store, &key(2), 400);

        // Reading key 1 makes key 2 the least recently used.
        store.get(&key(1)).unwrap();
        store.put(&key(3), &[3; 100]).unwrap();

        assert!(store.contains(&key(1)));
        assert!(!store.contains(&key(2)));
        assert!(store.contains(&key(3)));
    }

    #[test]
    fn test_total_never_exceeds_budget() {
        let dir = tempfile::tempdir().unwrap();
        let store = TileCacheStore::new(dir.path(), 1_000);

        for n in 0..50 {
            store.put(&key(n), &vec![n as u8; 90]).unwrap();
            assert!(store.size_bytes().unwrap() <= 1_000);
        }
    }

    #[test]
    fn test_evict_on_demand_reports_freed_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TileCacheStore::new(dir.path(), 1_000);
        writer.put(&key(1), &[0; 400]).unwrap();
        writer.put(&key(2), &[0; 400]).unwrap();

        let smaller = TileCacheStore::new(dir.path(), 500);
        let result = smaller.evict().unwrap();
        assert_eq!(result.files_deleted, 1);
        assert_eq!(result.bytes_freed, 400);
        assert_eq!(smaller.size_bytes().unwrap(), 400);
    }

    #[test]
    fn test_foreign_files_are_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), vec![0; 10_000]).unwrap();

        let store = TileCacheStore::new(dir.path(), 500);
        store.put(&key(1), &[0; 100]).unwrap();

        assert!(dir.path().join("README").exists());
        assert_eq!(store.size_bytes().unwrap(), 100);
    }
}
