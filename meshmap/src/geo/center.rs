//! Choosing where to center the map.
//!
//! Node positions reported over the mesh are noisy: a single node with a
//! stale or bogus fix can sit thousands of kilometres from everyone else. A
//! plain mean would be dragged toward it, so the center is estimated from the
//! per-axis median and then averaged over the points near that seed only.
//! Longitudes are unwrapped around the first point first, so a cluster that
//! straddles the antimeridian stays one cluster.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GeoCoordinate;

/// Smallest radius around the median seed whose points are averaged.
///
/// Keeps tightly packed clusters from collapsing onto the seed alone.
pub const MIN_TOLERANCE_KM: f64 = 2.0;

/// Multiple of the median seed distance used as the inclusion radius.
const TOLERANCE_FACTOR: f64 = 3.0;

/// A node as known to the node store, with its last reported position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: u32,
    #[serde(default)]
    pub coordinate: Option<GeoCoordinate>,
}

impl NodePosition {
    pub fn new(id: u32, coordinate: Option<GeoCoordinate>) -> Self {
        Self { id, coordinate }
    }

    fn known_coordinate(&self) -> Option<GeoCoordinate> {
        self.coordinate.filter(GeoCoordinate::is_finite)
    }
}

/// Picks the coordinate the map should center on.
///
/// If `preferred_id` names a node with a known position (usually the local
/// node), that exact position is returned. Otherwise a robust cluster center
/// of all known positions is returned, or `None` when no node has one.
pub fn choose_map_center(
    nodes: &[NodePosition],
    preferred_id: Option<u32>,
) -> Option<GeoCoordinate> {
    if let Some(id) = preferred_id {
        if let Some(coord) = nodes
            .iter()
            .find(|n| n.id == id)
            .and_then(NodePosition::known_coordinate)
        {
            return Some(coord);
        }
    }

    let points: Vec<GeoCoordinate> = nodes
        .iter()
        .filter_map(NodePosition::known_coordinate)
        .collect();
    robust_center(&points)
}

fn robust_center(points: &[GeoCoordinate]) -> Option<GeoCoordinate> {
    if points.is_empty() {
        return None;
    }

    let reference = points[0].longitude;
    let longitudes: Vec<f64> = points
        .iter()
        .map(|p| unwrap_longitude(p.longitude, reference))
        .collect();

    let seed = GeoCoordinate::new(
        median(points.iter().map(|p| p.latitude).collect()),
        wrap_longitude(median(longitudes.clone())),
    );

    let distances: Vec<f64> = points.iter().map(|p| p.distance_km(&seed)).collect();
    let tolerance = (TOLERANCE_FACTOR * median(distances.clone())).max(MIN_TOLERANCE_KM);

    let (mut lat_sum, mut lon_sum, mut count) = (0.0, 0.0, 0usize);
    for ((point, longitude), distance) in points.iter().zip(&longitudes).zip(&distances) {
        if *distance <= tolerance {
            lat_sum += point.latitude;
            lon_sum += *longitude;
            count += 1;
        }
    }

    debug!(
        total = points.len(),
        kept = count,
        tolerance_km = tolerance,
        "Computed robust map center"
    );

    // At least half of the points lie within the median distance of the seed.
    if count == 0 {
        return Some(seed);
    }
    Some(GeoCoordinate::new(
        lat_sum / count as f64,
        wrap_longitude(lon_sum / count as f64),
    ))
}

/// Shifts `longitude` by whole turns to within 180 degrees of `reference`.
fn unwrap_longitude(longitude: f64, reference: f64) -> f64 {
    let delta = longitude - reference;
    if delta.abs() <= 180.0 {
        longitude
    } else {
        longitude - 360.0 * (delta / 360.0).round()
    }
}

/// Brings an unwrapped longitude back into `[-180, 180]`.
fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
