//! Core domain types.
//!
//! Positions and trips come from the telemetry feed; enriched vehicles and
//! estimates are what the service hands back to its callers. Coordinates are
//! parsed once at the feed boundary and are numeric from then on.

mod estimate;
mod position;
mod segment;
mod trip;
mod vehicle;

pub use estimate::Estimate;
pub use position::{Coordinate, InvalidCoordinate, Snapshot, VehiclePosition};
pub use segment::{MAX_WAYPOINTS, RouteSegment};
pub use trip::{Stop, TripMetadata};
pub use vehicle::{EnrichedVehicle, vehicle_id};
