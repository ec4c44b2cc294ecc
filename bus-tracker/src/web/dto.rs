//! Data transfer objects for web responses.

use serde::Serialize;

use crate::domain::EnrichedVehicle;

/// Response of `GET /buses`.
#[derive(Debug, Serialize)]
pub struct BusInfoResponse {
    pub bus_info: Vec<EnrichedVehicle>,

    /// When this response was produced (unix seconds).
    pub response_timestamp: i64,

    /// When the underlying snapshot was fetched (unix seconds).
    pub sync_timestamp: i64,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
