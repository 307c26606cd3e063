//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; binaries call [`init_logging`]
//! once at startup to decide where they go.

use std::path::PathBuf;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "meshmap=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file in {}: {source}", .directory.display())]
    File {
        directory: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Directory for a `meshmap.log` file, in addition to stderr.
    pub file_directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_string(),
            file_directory: None,
        }
    }
}

impl LogConfig {
    /// Raises the default filter to `debug` for this crate.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.default_filter = "meshmap=debug,meshmap_cli=debug".to_string();
        }
        self
    }

    pub fn with_file_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.file_directory = Some(directory.into());
        self
    }
}

/// Installs the global subscriber.
///
/// When a log file is configured, the returned guard must be kept alive
/// until exit so buffered lines are flushed.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.file_directory {
        Some(directory) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix("meshmap.log")
                .build(directory)
                .map_err(|source| LoggingError::File {
                    directory: directory.clone(),
                    source,
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_timer(LocalTime::new(Rfc3339))
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let config = LogConfig::default();
        assert_eq!(config.default_filter, "meshmap=info");
        assert!(config.file_directory.is_none());
    }

    #[test]
    fn test_verbose_raises_level() {
        assert!(LogConfig::default()
            .verbose(true)
            .default_filter
            .contains("meshmap=debug"));
        assert_eq!(LogConfig::default().verbose(false).default_filter, DEFAULT_FILTER);
    }
}
