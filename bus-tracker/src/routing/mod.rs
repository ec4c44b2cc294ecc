//! Routing backends.
//!
//! [`RoutingClient`] asks the Bing Maps REST routes API for a driving route
//! through a segment's waypoints and reads its traffic-aware duration.
//! [`StraightLineRouter`] needs no network and is used in mock mode.

mod client;
mod error;
mod straight_line;
mod types;

pub use client::{RoutingClient, RoutingConfig, waypoint_query};
pub use error::RoutingError;
pub use straight_line::{StraightLineRouter, haversine_km};
pub use types::{RouteResource, RouteResourceSet, RouteResponse};
