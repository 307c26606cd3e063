//! Content-addressed keys for cached tiles.

use std::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// File extension of a stored tile.
pub const TILE_EXTENSION: &str = "tile";

/// File extension of a tile being written.
pub const TEMP_EXTENSION: &str = "tmp";

/// Lowercase hex SHA-256 digest of a tile's fetch URL.
///
/// The same URL always yields the same key, across process restarts, so the
/// on-disk cache survives between runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(String);

impl TileKey {
    pub fn from_url(url: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(url.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of this tile under `root`: `<root>/<h[0:2]>/<h[2:4]>/<h>.tile`.
    ///
    /// The two-level prefix bounds the number of entries per directory.
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.0[0..2])
            .join(&self.0[2..4])
            .join(format!("{}.{}", self.0, TILE_EXTENSION))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
