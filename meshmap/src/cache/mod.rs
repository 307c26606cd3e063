//! On-disk tile cache.
//!
//! - [`TileCacheStore`]: content-addressed tile bytes with an mtime-ordered
//!   byte budget
//! - [`TileFetchGate`]: the set of tiles with a background fetch in flight
//! - [`disk_cache_stats`] / [`clear_disk_cache`]: maintenance helpers for
//!   operator tooling
//!
//! Both the store and the gate are plain owned values. The caching transport
//! receives them at construction; nothing here is global.

mod gate;
mod key;
mod store;

pub use gate::{InFlightGuard, TileFetchGate};
pub use key::{TileKey, TEMP_EXTENSION, TILE_EXTENSION};
pub use store::TileCacheStore;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error on a specific cache path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache directory could not be listed.
    #[error("Invalid cache directory {}: {reason}", .path.display())]
    InvalidDirectory { path: PathBuf, reason: String },
}

impl CacheError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of an eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionResult {
    /// Number of tiles removed.
    pub files_deleted: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
}

impl fmt::Display for EvictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evicted {} tiles, freed {} bytes in {}ms",
            self.files_deleted, self.bytes_freed, self.duration_ms
        )
    }
}

/// Summary of the tiles stored in a cache directory.
#[derive(Debug, Clone, Default)]
pub struct DiskCacheStats {
    pub files: usize,
    pub bytes: u64,
    /// Least recently used tile.
    pub oldest: Option<DateTime<Local>>,
    /// Most recently used tile.
    pub newest: Option<DateTime<Local>>,
}

/// Result of clearing a cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: usize,
    pub bytes_freed: u64,
}

/// One stored tile found while walking the cache tree.
#[derive(Debug, Clone)]
pub(crate) struct TileFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Lists every `.tile` file in the two-level cache layout under `root`.
///
/// A missing root is an empty cache.
pub(crate) fn scan_tiles(root: &Path) -> Result<Vec<TileFile>, CacheError> {
    scan_files(root, TILE_EXTENSION)
}

fn scan_files(root: &Path, extension: &str) -> Result<Vec<TileFile>, CacheError> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let root_str = root.to_str().ok_or_else(|| CacheError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: "path is not valid UTF-8".to_string(),
    })?;
    let pattern = format!("{}/*/*/*.{}", glob::Pattern::escape(root_str), extension);
    let entries = glob::glob(&pattern).map_err(|e| CacheError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        // Entries can vanish between listing and stat; skip them.
        let Ok(path) = entry else { continue };
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        files.push(TileFile {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            path,
        });
    }
    Ok(files)
}

/// Counts the tiles in a cache directory.
pub fn disk_cache_stats(root: &Path) -> Result<DiskCacheStats, CacheError> {
    let tiles = scan_tiles(root)?;

    Ok(DiskCacheStats {
        files: tiles.len(),
        bytes: tiles.iter().map(|t| t.size).sum(),
        oldest: tiles.iter().map(|t| t.modified).min().map(DateTime::from),
        newest: tiles.iter().map(|t| t.modified).max().map(DateTime::from),
    })
}

/// Removes every stored and partially written tile under `root`.
///
/// Other files in the directory are left alone.
pub fn clear_disk_cache(root: &Path) -> Result<ClearResult, CacheError> {
    let mut result = ClearResult::default();

    for extension in [TILE_EXTENSION, TEMP_EXTENSION] {
        for file in scan_files(root, extension)? {
            match fs::remove_file(&file.path) {
                Ok(()) => {
                    result.files_deleted += 1;
                    result.bytes_freed += file.size;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(&file.path, e)),
            }
        }
    }

    Ok(result)
}
