//! Trip stop metadata.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A stop served by a trip.
///
/// Serialized with the feed's `stop_*` keys, which `/buses` clients rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    #[serde(rename = "stop_id")]
    pub id: String,
    #[serde(rename = "stop_name")]
    pub name: String,
    #[serde(rename = "stop_lat")]
    pub latitude: f64,
    #[serde(rename = "stop_lon")]
    pub longitude: f64,
}

impl Stop {
    /// Position of the stop.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Ordered stops of one trip.
///
/// Stop order is the direction of travel: it defines both where "next stop"
/// is searched and the order of the route path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripMetadata {
    pub trip_id: String,
    pub stops: Vec<Stop>,
}

impl TripMetadata {
    /// Name of the first stop with the given id.
    pub fn stop_name(&self, stop_id: &str) -> Option<&str> {
        self.stops
            .iter()
            .find(|s| s.id == stop_id)
            .map(|s| s.name.as_str())
    }

    /// Name of the terminus. Trips with fewer than two stops have none.
    pub fn last_stop_name(&self) -> Option<&str> {
        if self.stops.len() < 2 {
            return None;
        }
        self.stops.last().map(|s| s.name.as_str())
    }
}
