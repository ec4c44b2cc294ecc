//! Route segments sent to the routing service.

use super::Coordinate;

/// Maximum points of the path carried by one segment.
pub const MAX_WAYPOINTS: usize = 23;

/// One size-bounded piece of a vehicle's remaining path.
///
/// `waypoints` is a contiguous slice of the path. Every segment after the
/// first also carries the last waypoint of the previous segment as its
/// `lead_in`, so consecutive requests join up end to start.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub lead_in: Option<Coordinate>,
    pub waypoints: Vec<Coordinate>,
}

impl RouteSegment {
    /// Points to send, in order: the lead-in (if any) then the waypoints.
    pub fn request_points(&self) -> impl Iterator<Item = &Coordinate> {
        self.lead_in.iter().chain(self.waypoints.iter())
    }
}
