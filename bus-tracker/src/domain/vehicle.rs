//! Vehicles enriched with their trip's stops.

use serde::Serialize;

use super::{Stop, TripMetadata, VehiclePosition};

/// Stable identifier for a vehicle, derived from its trip id.
///
/// Trip ids repeat from day to day, so the id is the CRC-32 of the trip id
/// in lowercase hex rather than the trip id itself.
///
/// ```
/// use bus_tracker::domain::vehicle_id;
///
/// assert_eq!(vehicle_id("hello"), "3610a686");
/// ```
pub fn vehicle_id(trip_id: &str) -> String {
    format!("{:x}", crc32fast::hash(trip_id.as_bytes()))
}

/// A position joined with its trip metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedVehicle {
    pub id: String,
    pub line: String,
    pub next_stop_name: String,
    pub next_stop_id: String,
    pub last_stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stops: Vec<Stop>,

    /// Delay in minutes.
    pub delay: f64,
}

impl EnrichedVehicle {
    /// Join a position with the metadata of its trip.
    pub fn join(position: &VehiclePosition, trip: &TripMetadata) -> Self {
        Self {
            id: vehicle_id(&position.trip_id),
            line: position.line.clone(),
            next_stop_name: trip
                .stop_name(&position.next_stop_id)
                .unwrap_or_default()
                .to_string(),
            next_stop_id: position.next_stop_id.clone(),
            last_stop_name: trip.last_stop_name().unwrap_or_default().to_string(),
            latitude: position.position.latitude,
            longitude: position.position.longitude,
            stops: trip.stops.clone(),
            delay: f64::from(position.delay_secs) / 60.0,
        }
    }
}
