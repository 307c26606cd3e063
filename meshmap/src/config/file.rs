//! INI configuration file.
//!
//! ```ini
//! [cache]
//! directory = ~/.cache/meshmap/tiles
//! max_size = 200MB
//!
//! [fetch]
//! timeout_secs = 15
//! async_miss = true
//! user_agent = meshmap/0.1.0
//!
//! [source]
//! url_template = https://tile.openstreetmap.org/{z}/{x}/{y}.png
//! ```
//!
//! Missing keys take their defaults; present but malformed values are errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use super::size::parse_size;
use super::{
    default_cache_dir, ConfigError, TileCacheConfig, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_MAX_SIZE_BYTES, DEFAULT_USER_AGENT,
};
use crate::provider::TileSource;

/// Location of the user configuration file, e.g. `~/.config/meshmap/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meshmap")
        .join("config.ini")
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub max_size: u64,
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub async_miss: bool,
    pub user_agent: String,
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub url_template: String,
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub fetch: FetchSettings,
    pub source: SourceSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                directory: default_cache_dir(),
                max_size: DEFAULT_MAX_SIZE_BYTES,
            },
            fetch: FetchSettings {
                timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
                async_miss: true,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            source: SourceSettings {
                url_template: TileSource::openstreetmap().url_template().to_string(),
            },
        }
    }
}

impl ConfigFile {
    /// Loads the user configuration file.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("cache")) {
            if let Some(v) = section.get("directory") {
                config.cache.directory = expand_tilde(v);
            }
            if let Some(v) = section.get("max_size") {
                config.cache.max_size = parse_size(v)
                    .ok_or_else(|| parse_error("cache.max_size", v, "expected a size like 200MB"))?;
            }
        }

        if let Some(section) = ini.section(Some("fetch")) {
            if let Some(v) = section.get("timeout_secs") {
                config.fetch.timeout_secs = v
                    .trim()
                    .parse()
                    .map_err(|_| parse_error("fetch.timeout_secs", v, "expected whole seconds"))?;
            }
            if let Some(v) = section.get("async_miss") {
                config.fetch.async_miss = parse_bool(v)
                    .ok_or_else(|| parse_error("fetch.async_miss", v, "expected true or false"))?;
            }
            if let Some(v) = section.get("user_agent") {
                config.fetch.user_agent = v.trim().to_string();
            }
        }

        if let Some(section) = ini.section(Some("source")) {
            if let Some(v) = section.get("url_template") {
                TileSource::new("custom", v.trim())
                    .map_err(|e| parse_error("source.url_template", v, &e.to_string()))?;
                config.source.url_template = v.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Writes the user configuration file, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("cache"))
            .set("directory", self.cache.directory.to_string_lossy())
            .set("max_size", size_setting(self.cache.max_size));
        ini.with_section(Some("fetch"))
            .set("timeout_secs", self.fetch.timeout_secs.to_string())
            .set("async_miss", self.fetch.async_miss.to_string())
            .set("user_agent", self.fetch.user_agent.as_str());
        ini.with_section(Some("source"))
            .set("url_template", self.source.url_template.as_str());

        ini.write_to_file(path).map_err(write_error)
    }

    /// Library settings for the cache store and transport.
    pub fn to_cache_config(&self) -> TileCacheConfig {
        TileCacheConfig::new(self.cache.directory.clone())
            .with_max_size(self.cache.max_size)
            .with_fetch_timeout(Duration::from_secs(self.fetch.timeout_secs))
            .with_async_miss(self.fetch.async_miss)
    }

    /// Tile source described by `[source]`.
    pub fn tile_source(&self) -> Result<TileSource, ConfigError> {
        TileSource::new("custom", &self.source.url_template).map_err(|e| {
            parse_error("source.url_template", &self.source.url_template, &e.to_string())
        })
    }
}

fn parse_error(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Parse {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Writes sizes in the largest unit that keeps them exact.
fn size_setting(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b => b.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn expand_tilde(value: &str) -> PathBuf {
    let value = value.trim();
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.ini");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "");
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_values_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "[cache]\ndirectory = /var/tiles\nmax_size = 50MB\n\
             [fetch]\ntimeout_secs = 5\nasync_miss = false\n\
             [source]\nurl_template = https://tiles.example/{z}/{x}/{y}.png\n",
        );

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.cache.directory, PathBuf::from("/var/tiles"));
        assert_eq!(config.cache.max_size, 50 * 1024 * 1024);

        let cache = config.to_cache_config();
        assert_eq!(cache.fetch_timeout, Duration::from_secs(5));
        assert!(!cache.async_miss);
        assert_eq!(
            config.tile_source().unwrap().url_template(),
            "https://tiles.example/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn test_invalid_size_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[cache]\nmax_size = huge\n");
        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref key, .. } if key == "cache.max_size"));
    }

    #[test]
    fn test_invalid_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[source]\nurl_template = https://tiles.example/x.png\n");
        assert!(ConfigFile::load_from(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.directory = PathBuf::from("/srv/meshmap");
        config.cache.max_size = 64 * 1024 * 1024;
        config.fetch.async_miss = false;
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/tiles"), home.join("tiles"));
        }
        assert_eq!(expand_tilde("/abs/tiles"), PathBuf::from("/abs/tiles"));
    }

    #[test]
    fn test_size_setting_is_exact() {
        assert_eq!(size_setting(200 * 1024 * 1024), "200MB");
        assert_eq!(size_setting(2 * 1024 * 1024 * 1024), "2GB");
        assert_eq!(size_setting(1_000_001), "1000001");
        assert_eq!(parse_size(&size_setting(1_000_001)), Some(1_000_001));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
