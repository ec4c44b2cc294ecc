//! Vehicle positions and position snapshots.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Error returned when a coordinate string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without range checks; see [`Coordinate::parse`].
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse a coordinate from the decimal strings the telemetry feed sends.
    ///
    /// # Examples
    ///
    /// ```
    /// use bus_tracker::domain::Coordinate;
    ///
    /// let c = Coordinate::parse("50.0875", "14.4213").unwrap();
    /// assert_eq!(c.latitude, 50.0875);
    ///
    /// assert!(Coordinate::parse("north", "14.4").is_err());
    /// assert!(Coordinate::parse("91.0", "14.4").is_err());
    /// ```
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, InvalidCoordinate> {
        let latitude: f64 = latitude.trim().parse().map_err(|_| InvalidCoordinate {
            reason: "latitude is not a number",
        })?;
        let longitude: f64 = longitude.trim().parse().map_err(|_| InvalidCoordinate {
            reason: "longitude is not a number",
        })?;

        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinate {
                reason: "latitude out of range",
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinate {
                reason: "longitude out of range",
            });
        }

        Ok(Self::new(latitude, longitude))
    }
}

/// Last reported position of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    /// GTFS trip identifier. Reused across days.
    pub trip_id: String,

    /// Public line label (e.g. "177").
    pub line: String,

    /// GTFS identifier of the stop the vehicle is heading to.
    pub next_stop_id: String,

    pub position: Coordinate,

    /// Current delay in seconds (negative when ahead of schedule).
    pub delay_secs: i32,
}

/// All tracked vehicles at one instant.
///
/// A snapshot is cached and replaced as a whole; it is never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub vehicles: Vec<VehiclePosition>,

    /// Unix timestamp (seconds) of the fetch that produced this snapshot.
    pub synced_at: i64,
}

impl Snapshot {
    /// Distinct trip identifiers, in first-seen order.
    pub fn trip_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.vehicles
            .iter()
            .filter(|v| seen.insert(v.trip_id.as_str()))
            .map(|v| v.trip_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(trip_id: &str) -> VehiclePosition {
        VehiclePosition {
            trip_id: trip_id.to_string(),
            line: "177".to_string(),
            next_stop_id: "U1".to_string(),
            position: Coordinate::new(50.0, 14.0),
            delay_secs: 0,
        }
    }

    #[test]
    fn parse_valid_coordinate() {
        let c = Coordinate::parse(" 50.10 ", "-14.25").unwrap();
        assert_eq!(c, Coordinate::new(50.10, -14.25));
    }

    #[test]
    fn parse_rejects_garbage_and_out_of_range() {
        assert!(Coordinate::parse("", "14.0").is_err());
        assert!(Coordinate::parse("50.0", "abc").is_err());
        assert!(Coordinate::parse("NaN", "14.0").is_err());
        assert!(Coordinate::parse("50.0", "180.5").is_err());
        assert!(Coordinate::parse("-90.01", "0").is_err());
    }

    #[test]
    fn trip_ids_are_distinct_and_ordered() {
        let snapshot = Snapshot {
            vehicles: vec![position("b"), position("a"), position("b"), position("c")],
            synced_at: 0,
        };
        assert_eq!(snapshot.trip_ids(), vec!["b", "a", "c"]);
    }
}
