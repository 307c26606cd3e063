//! Fetch-and-cache primitive.

use std::sync::Arc;

use tracing::{debug, warn};

use super::http::TileTransport;
use super::types::{TileRequest, TileResponse};
use super::TransportError;
use crate::cache::{TileCacheStore, TileKey};

/// Performs one real round trip and persists a usable result.
///
/// [`CachingTileTransport`](super::CachingTileTransport) calls this on the
/// caller's thread for synchronous misses and on a background task for
/// asynchronous ones.
pub struct TileFetcher<T> {
    transport: T,
    store: Arc<TileCacheStore>,
}

impl<T> TileFetcher<T> {
    pub fn new(transport: T, store: Arc<TileCacheStore>) -> Self {
        Self { transport, store }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &Arc<TileCacheStore> {
        &self.store
    }
}

impl<T: TileTransport> TileFetcher<T> {
    /// Fetches `request` from upstream and stores it under `key` when the
    /// response is a 200 with a body.
    ///
    /// Network errors are returned. A failed cache write is only logged: the
    /// response is still handed back, and the tile will simply be fetched
    /// again next time.
    pub fn fetch(
        &self,
        request: &TileRequest,
        key: &TileKey,
    ) -> Result<TileResponse, TransportError> {
        let response = self.transport.round_trip(request)?;

        if response.is_cacheable() {
            match self.store.put(key, &response.body) {
                Ok(()) => debug!(url = %request.url, bytes = response.body.len(), "Cached tile"),
                Err(e) => warn!(url = %request.url, error = %e, "Failed to cache tile"),
            }
        } else {
            debug!(url = %request.url, status = %response.status, "Tile response not cached");
        }

        Ok(response)
    }
}
