//! Tile HTTP transport.
//!
//! [`TileTransport`] is the seam a map widget's HTTP client goes through.
//! [`ReqwestTransport`] talks to the network; [`CachingTileTransport`] wraps
//! any transport with the disk cache and background fetching.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshmap::config::TileCacheConfig;
//! use meshmap::transport::{CachingTileTransport, ReqwestTransport, TileRequest, TileTransport};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let config = TileCacheConfig::default();
//! let upstream = ReqwestTransport::new("my-map/1.0")?;
//! let transport = CachingTileTransport::from_config(upstream, &config, runtime.handle().clone());
//! transport.set_listener(|| println!("repaint"));
//!
//! let request = TileRequest::get("https://tile.openstreetmap.org/0/0/0.png");
//! let response = transport.round_trip(&request)?;
//! if response.is_placeholder() {
//!     // draw nothing yet; the listener fires when the tile lands
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod caching;
mod fetcher;
mod http;
mod types;

pub use caching::{CachingTileTransport, TileAvailableListener, TileProgress};
pub use fetcher::TileFetcher;
pub use http::{ReqwestTransport, TileTransport};
pub use types::{TileRequest, TileResponse, CACHED_CONTENT_TYPE};

use thiserror::Error;

/// Errors returned by a transport round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("HTTP client error: {0}")]
    Client(String),
}
