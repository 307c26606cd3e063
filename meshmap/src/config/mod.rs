//! Configuration for the tile cache and its fetch transport.
//!
//! [`TileCacheConfig`] is what the library consumes. [`ConfigFile`] is the
//! user-editable INI file the CLI reads it from.

mod file;
mod size;

pub use file::{config_file_path, ConfigFile};
pub use size::{format_size, parse_size};

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default byte budget of the disk cache (200 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 200 * 1024 * 1024;

/// Default timeout of a single background tile fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default `User-Agent` sent to tile servers.
///
/// Public tile servers (OpenStreetMap in particular) require an identifying
/// user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("meshmap/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    Parse {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings consumed by the cache store and caching transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCacheConfig {
    /// Root directory of the disk cache.
    pub directory: PathBuf,

    /// Byte budget enforced after every write.
    pub max_size_bytes: u64,

    /// Timeout applied to each background fetch.
    pub fetch_timeout: Duration,

    /// Serve misses with a placeholder and fetch in the background.
    pub async_miss: bool,
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl TileCacheConfig {
    /// Creates a config with default limits for the given directory.
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            async_miss: true,
        }
    }

    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_async_miss(mut self, async_miss: bool) -> Self {
        self.async_miss = async_miss;
        self
    }
}

/// Platform cache directory for tiles, e.g. `~/.cache/meshmap/tiles`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meshmap")
        .join("tiles")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TileCacheConfig::new(PathBuf::from("/tmp/tiles"));
        assert_eq!(config.max_size_bytes, 200 * 1024 * 1024);
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert!(config.async_miss);
    }

    #[test]
    fn test_builder_methods() {
        let config = TileCacheConfig::new(PathBuf::from("/tmp/tiles"))
            .with_max_size(1024)
            .with_fetch_timeout(Duration::from_secs(2))
            .with_async_miss(false);
        assert_eq!(config.max_size_bytes, 1024);
        assert_eq!(config.fetch_timeout, Duration::from_secs(2));
        assert!(!config.async_miss);
    }

    #[test]
    fn test_default_cache_dir_ends_with_tiles() {
        let dir = default_cache_dir();
        assert!(dir.ends_with("meshmap/tiles"));
    }
}
