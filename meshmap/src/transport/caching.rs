//! Caching decorator around a [`TileTransport`].
//!
//! ```text
//! round_trip(GET url)
//!   ├─ hit   → 200 image/png from disk, no network
//!   └─ miss
//!        ├─ sync mode  → TileFetcher::fetch on this thread
//!        └─ async mode → claim key in TileFetchGate
//!                          ├─ claimed → spawn background fetch
//!                          └─ taken   → nothing to do
//!                        return placeholder immediately
//! ```
//!
//! The background task persists the tile, releases the key and then calls
//! the registered [`TileAvailableListener`], whether or not the fetch
//! succeeded.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::fetcher::TileFetcher;
use super::http::TileTransport;
use super::types::{TileRequest, TileResponse};
use super::TransportError;
use crate::cache::{InFlightGuard, TileCacheStore, TileFetchGate, TileKey};
use crate::config::TileCacheConfig;

/// Notified each time a background fetch completes.
///
/// Called from the blocking pool, possibly from several threads at once and
/// concurrently with viewport changes. Implementations should only schedule
/// a repaint on the UI thread.
pub trait TileAvailableListener: Send + Sync {
    fn tile_available(&self);
}

impl<F> TileAvailableListener for F
where
    F: Fn() + Send + Sync,
{
    fn tile_available(&self) {
        self()
    }
}

/// Load state of a set of tiles, for a "loading N/M" indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileProgress {
    pub total: usize,
    pub cached: usize,
    pub in_flight: usize,
}

impl TileProgress {
    pub fn is_complete(&self) -> bool {
        self.cached == self.total
    }

    /// Tiles neither cached nor being fetched (failed or never requested).
    pub fn missing(&self) -> usize {
        self.total - self.cached - self.in_flight
    }
}

/// Transport that serves tiles from a [`TileCacheStore`] and fills it from
/// the wrapped transport.
pub struct CachingTileTransport<T> {
    fetcher: Arc<TileFetcher<T>>,
    gate: Arc<TileFetchGate>,
    listener: Arc<OnceLock<Arc<dyn TileAvailableListener>>>,
    runtime: Handle,
    fetch_timeout: Duration,
    async_miss: bool,
}

impl<T: TileTransport + 'static> CachingTileTransport<T> {
    /// Wraps `inner` with an existing store and gate.
    ///
    /// Background fetches run on `runtime`'s blocking pool.
    pub fn new(
        inner: T,
        store: Arc<TileCacheStore>,
        gate: Arc<TileFetchGate>,
        config: &TileCacheConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            fetcher: Arc::new(TileFetcher::new(inner, store)),
            gate,
            listener: Arc::new(OnceLock::new()),
            runtime,
            fetch_timeout: config.fetch_timeout,
            async_miss: config.async_miss,
        }
    }

    /// Wraps `inner` with a fresh store and gate built from `config`.
    pub fn from_config(inner: T, config: &TileCacheConfig, runtime: Handle) -> Self {
        Self::new(
            inner,
            Arc::new(TileCacheStore::from_config(config)),
            Arc::new(TileFetchGate::new()),
            config,
            runtime,
        )
    }

    /// Registers the completion listener.
    ///
    /// Only the first registration takes effect; returns `false` if a
    /// listener was already set.
    pub fn set_listener<L>(&self, listener: L) -> bool
    where
        L: TileAvailableListener + 'static,
    {
        self.listener.set(Arc::new(listener)).is_ok()
    }

    pub fn store(&self) -> &Arc<TileCacheStore> {
        self.fetcher.store()
    }

    pub fn gate(&self) -> &Arc<TileFetchGate> {
        &self.gate
    }

    pub fn is_async(&self) -> bool {
        self.async_miss
    }

    /// Counts how many of `urls` are cached or being fetched.
    ///
    /// Does not read tile contents or start any fetch.
    pub fn progress<S: AsRef<str>>(&self, urls: &[S]) -> TileProgress {
        let mut progress = TileProgress {
            total: urls.len(),
            ..TileProgress::default()
        };
        for url in urls {
            let key = TileKey::from_url(url.as_ref());
            if self.store().contains(&key) {
                progress.cached += 1;
            } else if self.gate.is_in_flight(&key) {
                progress.in_flight += 1;
            }
        }
        progress
    }

    fn spawn_fetch(&self, url: &str, guard: InFlightGuard) {
        let fetcher = Arc::clone(&self.fetcher);
        let listener = Arc::clone(&self.listener);
        let request = TileRequest::get(url).with_timeout(self.fetch_timeout);

        self.runtime.spawn_blocking(move || {
            let key = guard.key().clone();

            // A fetch that finished between our cache read and the claim
            // has already stored the tile.
            if fetcher.store().contains(&key) {
                trace!(url = %request.url, "Tile cached by an earlier fetch");
            } else {
                match fetcher.fetch(&request, &key) {
                    Ok(response) if response.status == StatusCode::OK => {}
                    Ok(response) => warn!(
                        url = %request.url,
                        status = %response.status,
                        "Tile server returned an error"
                    ),
                    Err(e) => warn!(url = %request.url, error = %e, "Background tile fetch failed"),
                }
            }

            drop(guard);
            if let Some(listener) = listener.get() {
                listener.tile_available();
            }
        });
    }
}

impl<T: TileTransport + 'static> TileTransport for CachingTileTransport<T> {
    fn round_trip(&self, request: &TileRequest) -> Result<TileResponse, TransportError> {
        if request.method != Method::GET || Url::parse(&request.url).is_err() {
            return self.fetcher.transport().round_trip(request);
        }

        let key = TileKey::from_url(&request.url);
        match self.store().get(&key) {
            Ok(Some(data)) => {
                trace!(url = %request.url, "Tile cache hit");
                return Ok(TileResponse::cached(data));
            }
            Ok(None) => {}
            Err(e) => warn!(url = %request.url, error = %e, "Unreadable cached tile, refetching"),
        }

        if !self.async_miss {
            return self.fetcher.fetch(request, &key);
        }

        match self.gate.try_begin(&key) {
            Some(guard) => {
                debug!(url = %request.url, "Tile cache miss, fetching in background");
                self.spawn_fetch(&request.url, guard);
            }
            None => trace!(url = %request.url, "Tile fetch already in flight"),
        }
        Ok(TileResponse::placeholder())
    }
}

impl<T> std::fmt::Debug for CachingTileTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingTileTransport")
            .field("store", self.fetcher.store())
            .field("in_flight", &self.gate.len())
            .field("fetch_timeout", &self.fetch_timeout)
            .field("async_miss", &self.async_miss)
            .finish()
    }
}
