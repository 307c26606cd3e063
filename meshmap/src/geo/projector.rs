//! Projection between geographic coordinates and canvas pixels.
//!
//! The viewport's tile `(x, y)` is drawn centered on the canvas. A coordinate
//! is placed by taking its fractional tile position at the viewport zoom,
//! subtracting the center of the viewport tile, scaling by [`TILE_SIZE`] and
//! offsetting by half the canvas.

use super::viewport::ViewportState;
use super::{tile_fraction_to_coordinate, to_tile_fraction, GeoCoordinate, MAX_ZOOM, TILE_SIZE};

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True for zero, negative or non-finite dimensions.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// A position on the canvas in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Places a coordinate on the canvas.
///
/// Returns `None` for an empty canvas or a non-finite coordinate. Points
/// outside the canvas are still returned; culling is up to the caller.
pub fn project_to_screen(
    coord: &GeoCoordinate,
    viewport: &ViewportState,
    canvas: CanvasSize,
) -> Option<ScreenPoint> {
    if canvas.is_empty() || !coord.is_finite() {
        return None;
    }

    let (tx, ty) = to_tile_fraction(coord, viewport.zoom);
    let dx = tx - (viewport.x as f64 + 0.5);
    let dy = ty - (viewport.y as f64 + 0.5);

    Some(ScreenPoint {
        x: dx * TILE_SIZE + canvas.width / 2.0,
        y: dy * TILE_SIZE + canvas.height / 2.0,
    })
}

/// Inverse of [`project_to_screen`], used for hit-testing clicks.
pub fn screen_to_coordinate(
    point: ScreenPoint,
    viewport: &ViewportState,
    canvas: CanvasSize,
) -> Option<GeoCoordinate> {
    if canvas.is_empty() || !(point.x.is_finite() && point.y.is_finite()) {
        return None;
    }

    let tx = (point.x - canvas.width / 2.0) / TILE_SIZE + viewport.x as f64 + 0.5;
    let ty = (point.y - canvas.height / 2.0) / TILE_SIZE + viewport.y as f64 + 0.5;

    Some(tile_fraction_to_coordinate(tx, ty, viewport.zoom))
}

/// Builds the viewport whose center tile contains `coord` at `zoom`.
///
/// Zoom is clamped to `MAX_ZOOM`. Projecting `coord` through the result
/// lands within half a tile of the canvas center.
pub fn center_viewport(coord: &GeoCoordinate, zoom: u8) -> ViewportState {
    let zoom = zoom.min(MAX_ZOOM);
    let (tx, ty) = to_tile_fraction(coord, zoom);
    let max_index = (1_i64 << zoom) - 1;

    ViewportState::new(
        zoom,
        (tx.floor() as i64).clamp(0, max_index),
        (ty.floor() as i64).clamp(0, max_index),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF: GeoCoordinate = GeoCoordinate::new(37.7749, -122.4194);

    #[test]
    fn test_empty_canvas_is_rejected() {
        let viewport = center_viewport(&SF, 12);
        assert!(project_to_screen(&SF, &viewport, CanvasSize::new(0.0, 0.0)).is_none());
        assert!(project_to_screen(&SF, &viewport, CanvasSize::new(800.0, 0.0)).is_none());
        assert!(project_to_screen(&SF, &viewport, CanvasSize::new(f64::NAN, 10.0)).is_none());
    }

    #[test]
    fn test_non_finite_coordinate_is_rejected() {
        let viewport = ViewportState::new(3, 1, 1);
        let bad = GeoCoordinate::new(f64::NAN, 0.0);
        assert!(project_to_screen(&bad, &viewport, CanvasSize::new(512.0, 512.0)).is_none());
    }

    #[test]
    fn test_centered_coordinate_lands_near_canvas_center() {
        let canvas = CanvasSize::new(800.0, 600.0);
        for zoom in [0, 4, 12, 19] {
            let viewport = center_viewport(&SF, zoom);
            let p = project_to_screen(&SF, &viewport, canvas).unwrap();
            assert!((p.x - 400.0).abs() <= TILE_SIZE / 2.0, "zoom {} x {}", zoom, p.x);
            assert!((p.y - 300.0).abs() <= TILE_SIZE / 2.0, "zoom {} y {}", zoom, p.y);
        }
    }

    #[test]
    fn test_pan_east_shifts_exactly_one_tile_left() {
        let canvas = CanvasSize::new(1024.0, 768.0);
        let mut viewport = center_viewport(&SF, 14);
        let before = project_to_screen(&SF, &viewport, canvas).unwrap();

        viewport.pan_east();
        let after = project_to_screen(&SF, &viewport, canvas).unwrap();

        assert!((before.x - after.x - TILE_SIZE).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_pan_south_shifts_exactly_one_tile_up() {
        let canvas = CanvasSize::new(1024.0, 768.0);
        let mut viewport = center_viewport(&SF, 9);
        let before = project_to_screen(&SF, &viewport, canvas).unwrap();

        viewport.pan_south();
        let after = project_to_screen(&SF, &viewport, canvas).unwrap();

        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y - TILE_SIZE).abs() < 1e-6);
    }

    #[test]
    fn test_screen_to_coordinate_inverts_projection() {
        let canvas = CanvasSize::new(640.0, 480.0);
        let viewport = center_viewport(&SF, 15);
        let p = project_to_screen(&SF, &viewport, canvas).unwrap();
        let back = screen_to_coordinate(p, &viewport, canvas).unwrap();

        assert!((back.latitude - SF.latitude).abs() < 1e-9);
        assert!((back.longitude - SF.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_center_viewport_clamps_edges() {
        let viewport = center_viewport(&GeoCoordinate::new(-90.0, 180.0), 2);
        assert_eq!(viewport, ViewportState::new(2, 3, 3));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_centering_roundtrip_property(
                lat in -85.0..85.0_f64,
                lon in -180.0..179.999_f64,
                zoom in 0u8..=19,
                width in 256.0..4096.0_f64,
                height in 256.0..4096.0_f64,
            ) {
                let coord = GeoCoordinate::new(lat, lon);
                let canvas = CanvasSize::new(width, height);
                let viewport = center_viewport(&coord, zoom);
                let p = project_to_screen(&coord, &viewport, canvas).unwrap();

                prop_assert!((p.x - width / 2.0).abs() <= TILE_SIZE / 2.0 + 1e-6);
                prop_assert!((p.y - height / 2.0).abs() <= TILE_SIZE / 2.0 + 1e-6);
            }

            #[test]
            fn test_pan_east_property(
                lat in -80.0..80.0_f64,
                lon in -179.0..179.0_f64,
                zoom in 0u8..=19,
            ) {
                let coord = GeoCoordinate::new(lat, lon);
                let canvas = CanvasSize::new(512.0, 512.0);
                let mut viewport = center_viewport(&coord, zoom);
                let before = project_to_screen(&coord, &viewport, canvas).unwrap();
                viewport.pan_east();
                let after = project_to_screen(&coord, &viewport, canvas).unwrap();

                prop_assert!((before.x - after.x - TILE_SIZE).abs() < 1e-6);
                prop_assert!((before.y - after.y).abs() < 1e-9);
            }
        }
    }
}
