//! Geographic coordinates and Web Mercator tile math.
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the fractional slippy-map tile positions used by the map widget, plus
//! the viewport state machine, the screen projector and the map center
//! selector built on top of them.

mod center;
mod projector;
mod viewport;

pub use center::{choose_map_center, NodePosition, MIN_TOLERANCE_KM};
pub use projector::{
    center_viewport, project_to_screen, screen_to_coordinate, CanvasSize, ScreenPoint,
};
pub use viewport::{TileAddress, ViewportState};

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by the tile widget.
pub const MAX_ZOOM: u8 = 19;

/// Edge length of one tile in screen pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true when both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Great-circle distance to another coordinate in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoCoordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

/// Number of tiles along one axis at the given zoom level.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32)
}

/// Converts geographic coordinates to a fractional tile position.
///
/// The integer part of each component is the tile column/row, the fractional
/// part is the position inside that tile. Latitude is clamped to the Web
/// Mercator range so polar inputs stay finite.
#[inline]
pub fn to_tile_fraction(coord: &GeoCoordinate, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom);
    let lat = coord.latitude.clamp(MIN_LAT, MAX_LAT);

    // Convert longitude to tile X coordinate
    let x = (coord.longitude + 180.0) / 360.0 * n;

    // Convert latitude to tile Y coordinate using Web Mercator projection
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    (x, y)
}

/// Converts a fractional tile position back to geographic coordinates.
#[inline]
pub fn tile_fraction_to_coordinate(x: f64, y: f64, zoom: u8) -> GeoCoordinate {
    let n = tiles_per_axis(zoom);

    let lon = x / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();

    GeoCoordinate::new(lat_rad * 180.0 / PI, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let (x, y) = to_tile_fraction(&GeoCoordinate::new(40.7128, -74.0060), 16);
        assert_eq!(x.floor() as u32, 19295);
        assert_eq!(y.floor() as u32, 24640);
    }

    #[test]
    fn test_equator_prime_meridian_is_grid_center() {
        let (x, y) = to_tile_fraction(&GeoCoordinate::new(0.0, 0.0), 10);
        assert!((x - 512.0).abs() < 1e-9);
        assert!((y - 512.0).abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitude_is_clamped() {
        let (_, y) = to_tile_fraction(&GeoCoordinate::new(90.0, 0.0), 3);
        assert!(y.is_finite());
        assert!(y.abs() < 1e-6, "north pole clamps to top edge, got {}", y);
    }

    #[test]
    fn test_fraction_roundtrip() {
        let london = GeoCoordinate::new(51.5074, -0.1278);
        for zoom in [0, 5, 10, 15, 19] {
            let (x, y) = to_tile_fraction(&london, zoom);
            let back = tile_fraction_to_coordinate(x, y, zoom);
            assert!((back.latitude - london.latitude).abs() < 1e-9);
            assert!((back.longitude - london.longitude).abs() < 1e-9);
        }
    }

    #[test]
    fn test_distance_km() {
        let sf = GeoCoordinate::new(37.7749, -122.4194);
        let la = GeoCoordinate::new(34.0522, -118.2437);
        let d = sf.distance_km(&la);
        assert!((d - 559.0).abs() < 5.0, "SF-LA distance was {}", d);
        assert_eq!(sf.distance_km(&sf), 0.0);
    }
}
