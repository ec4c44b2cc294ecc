//! Arrival estimates.

use serde::Serialize;

/// Estimated travel time of a vehicle to a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    /// Minutes until arrival.
    pub estimate: f64,
    pub bus_id: String,
    pub stop_id: String,
}

impl Estimate {
    /// Create an estimate of `estimate` minutes.
    pub fn new(estimate: f64, bus_id: impl Into<String>, stop_id: impl Into<String>) -> Self {
        Self {
            estimate,
            bus_id: bus_id.into(),
            stop_id: stop_id.into(),
        }
    }
}
