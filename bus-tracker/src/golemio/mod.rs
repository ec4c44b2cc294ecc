//! Golemio open-data client.
//!
//! Golemio publishes Prague's public transport telemetry. Two endpoints are
//! used:
//! - `vehiclepositions` - paginated last known position of every vehicle
//! - `gtfs/trips/{id}` - one trip's ordered stops
//!
//! Coordinates in the position feed are decimal strings; they are parsed into
//! numbers here and nowhere else.

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{GolemioClient, GolemioConfig};
pub use convert::{convert_positions, convert_trip};
pub use error::FeedError;
pub use mock::MockFeed;
pub use types::{
    GolemioStop, GolemioStopProperties, GolemioTrip, LastPosition, PositionFeature,
    PositionProperties, PositionResponse, TripRef,
};
