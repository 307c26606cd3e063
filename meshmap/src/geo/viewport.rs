//! Viewport state machine over integer tile coordinates.
//!
//! `ViewportState` is the one authoritative description of what the map is
//! looking at. The tile widget derives its own geometry from it through the
//! projector instead of keeping a second, manually synchronised copy.

use serde::{Deserialize, Serialize};

use super::projector::CanvasSize;
use super::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE};

/// Address of a single tile in the slippy-map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

/// The tile at the center of the canvas, at a zoom level.
///
/// `x` and `y` are signed so that panning past the edge of the grid is a
/// plain arithmetic step; wrapping is applied only when enumerating tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportState {
    pub zoom: u8,
    pub x: i64,
    pub y: i64,
}

impl ViewportState {
    /// Creates a viewport, clamping `zoom` to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn new(zoom: u8, x: i64, y: i64) -> Self {
        Self {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            x,
            y,
        }
    }

    pub fn pan_east(&mut self) {
        self.x += 1;
    }

    pub fn pan_west(&mut self) {
        self.x -= 1;
    }

    pub fn pan_north(&mut self) {
        self.y -= 1;
    }

    pub fn pan_south(&mut self) {
        self.y += 1;
    }

    /// One level finer: the same area is now addressed by twice the tile index.
    ///
    /// No-op at `MAX_ZOOM`.
    pub fn zoom_in(&mut self) {
        if self.zoom >= MAX_ZOOM {
            return;
        }
        self.zoom += 1;
        self.x *= 2;
        self.y *= 2;
    }

    /// One level coarser, the exact inverse of [`zoom_in`](Self::zoom_in).
    ///
    /// Uses floor division so negative (off-grid) indices map consistently.
    /// No-op at `MIN_ZOOM`.
    pub fn zoom_out(&mut self) {
        if self.zoom <= MIN_ZOOM {
            return;
        }
        self.zoom -= 1;
        self.x = self.x.div_euclid(2);
        self.y = self.y.div_euclid(2);
    }

    /// Enumerates the tiles that cover a canvas of the given size.
    ///
    /// Columns wrap around the antimeridian; rows above or below the grid
    /// are skipped. Tiles are returned row by row, west to east. A zoom
    /// above `MAX_ZOOM` is treated as `MAX_ZOOM`.
    pub fn visible_tiles(&self, canvas: CanvasSize) -> Vec<TileAddress> {
        if canvas.is_empty() {
            return Vec::new();
        }

        let zoom = self.zoom.min(MAX_ZOOM);
        let n = 1_i64 << zoom;
        let reach_x = tile_reach(canvas.width, n);
        let reach_y = tile_reach(canvas.height, n);
        let columns = (2 * reach_x + 1).min(n);

        let first_row = self.y.saturating_sub(reach_y).max(0);
        let last_row = self.y.saturating_add(reach_y).min(n - 1);
        let first_column = self.x.saturating_sub(reach_x);

        let mut tiles = Vec::new();
        for y in first_row..=last_row {
            for offset in 0..columns {
                tiles.push(TileAddress {
                    zoom,
                    x: first_column.wrapping_add(offset).rem_euclid(n) as u32,
                    y: y as u32,
                });
            }
        }
        tiles
    }
}

/// Tiles needed on each side of the center tile to cover `extent` pixels,
/// capped at the grid size `n`.
fn tile_reach(extent: f64, n: i64) -> i64 {
    // The center tile spans [-TILE_SIZE/2, TILE_SIZE/2) around the canvas center.
    let reach = ((extent / 2.0 - TILE_SIZE / 2.0) / TILE_SIZE).ceil().max(0.0);
    reach.min(n as f64) as i64
}
