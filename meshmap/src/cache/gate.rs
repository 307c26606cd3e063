//! In-flight deduplication of tile fetches.
//!
//! The gate records which tiles are currently being fetched in the
//! background. Claiming a key hands out an [`InFlightGuard`]; the key is
//! released when the guard drops, whatever the outcome of the fetch, so a
//! failed tile can always be retried.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::key::TileKey;

/// Set of tile keys with a fetch in progress.
#[derive(Debug, Default)]
pub struct TileFetchGate {
    in_flight: Mutex<HashSet<TileKey>>,
}

impl TileFetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims `key`.
    ///
    /// Returns `None` if another fetch for the same key is already running.
    pub fn try_begin(self: &Arc<Self>, key: &TileKey) -> Option<InFlightGuard> {
        let inserted = self.in_flight.lock().insert(key.clone());
        inserted.then(|| InFlightGuard {
            gate: Arc::clone(self),
            key: key.clone(),
        })
    }

    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.in_flight.lock().contains(key)
    }

    /// Number of fetches currently running.
    pub fn len(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.lock().is_empty()
    }

    fn release(&self, key: &TileKey) {
        self.in_flight.lock().remove(key);
    }
}

/// Ownership of one in-flight key. Dropping it releases the key.
#[derive(Debug)]
pub struct InFlightGuard {
    gate: Arc<TileFetchGate>,
    key: TileKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &TileKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gate.release(&self.key);
    }
}
