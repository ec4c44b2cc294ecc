//! Golemio API response DTOs.
//!
//! These map directly to the JSON the API returns. Fields the feed sometimes
//! sends as `null` are `Option`s; conversion to domain types decides what to
//! do with them.

use serde::{Deserialize, Serialize};

/// One page of `vehiclepositions`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PositionResponse {
    #[serde(default)]
    pub features: Vec<PositionFeature>,
}

/// A GeoJSON feature describing one vehicle.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PositionFeature {
    pub properties: PositionProperties,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PositionProperties {
    pub trip: TripRef,
    pub last_position: LastPosition,
}

/// Which trip the vehicle is running.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TripRef {
    /// GTFS trip identifier.
    pub gtfs_trip_id: Option<String>,

    /// Line label as shown to passengers.
    pub cis_short_name: Option<String>,
}

/// Most recent position report.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LastPosition {
    pub gtfs_next_stop_id: Option<String>,

    /// Latitude as a decimal string.
    pub lat: String,

    /// Longitude as a decimal string.
    pub lng: String,

    /// Delay in seconds.
    pub delay: Option<i32>,
}

/// Response of `gtfs/trips/{id}?includeStops=true`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GolemioTrip {
    pub trip_id: String,

    #[serde(default)]
    pub stops: Vec<GolemioStop>,
}

/// A stop as a GeoJSON feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GolemioStop {
    pub properties: GolemioStopProperties,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GolemioStopProperties {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}
