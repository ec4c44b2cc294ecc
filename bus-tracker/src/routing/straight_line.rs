//! Offline router based on great-circle distance.

use crate::domain::{Coordinate, RouteSegment};
use crate::estimator::RouteService;

use super::error::RoutingError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimates durations as straight-line distance at a fixed average speed.
#[derive(Debug, Clone)]
pub struct StraightLineRouter {
    speed_kmh: f64,
}

impl StraightLineRouter {
    /// Create a router assuming an average speed of `speed_kmh`.
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Seconds needed to cover the segment's points in order.
    pub fn duration_secs(&self, segment: &RouteSegment) -> u32 {
        let points: Vec<Coordinate> = segment.request_points().copied().collect();
        let km: f64 = points.windows(2).map(|w| haversine_km(w[0], w[1])).sum();

        if self.speed_kmh <= 0.0 {
            return 0;
        }
        (km / self.speed_kmh * 3600.0).round() as u32
    }
}

impl Default for StraightLineRouter {
    /// Typical average speed of a city bus including stops.
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl RouteService for StraightLineRouter {
    async fn travel_duration(&self, segment: &RouteSegment) -> Result<u32, RoutingError> {
        Ok(self.duration_secs(segment))
    }
}
