//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use meshmap::config::ConfigError;
use meshmap::transport::TransportError;

/// Errors reported to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    Config(String),
    CacheClear(String),
    CacheStats(String),
    CacheEvict(String),
    Transport(TransportError),
    Runtime(String),
    InvalidArgument(String),
    ReadNodes { path: PathBuf, reason: String },
    NoCoordinates,
    IncompleteFetch { missing: usize, total: usize },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::CacheClear(msg) => write!(f, "Failed to clear cache: {}", msg),
            CliError::CacheStats(msg) => write!(f, "Failed to read cache statistics: {}", msg),
            CliError::CacheEvict(msg) => write!(f, "Failed to evict cached tiles: {}", msg),
            CliError::Transport(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to start async runtime: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::ReadNodes { path, reason } => {
                write!(f, "Failed to read nodes from {}: {}", path.display(), reason)
            }
            CliError::NoCoordinates => write!(f, "No node has a known position"),
            CliError::IncompleteFetch { missing, total } => {
                write!(f, "{} of {} tiles could not be fetched", missing, total)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CliError::IncompleteFetch {
                missing: 2,
                total: 12
            }
            .to_string(),
            "2 of 12 tiles could not be fetched"
        );
        let err = CliError::ReadNodes {
            path: PathBuf::from("/tmp/nodes.json"),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("/tmp/nodes.json"));
        assert_eq!(
            CliError::CacheEvict("disk full".to_string()).to_string(),
            "Failed to evict cached tiles: disk full"
        );
    }

    #[test]
    fn test_from_transport_error() {
        let err: CliError = TransportError::Http("refused".to_string()).into();
        assert!(err.to_string().contains("refused"));
    }
}
