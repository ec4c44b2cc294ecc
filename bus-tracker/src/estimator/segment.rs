//! Splitting a vehicle's remaining path into routing requests.

use std::iter;

use crate::domain::{Coordinate, MAX_WAYPOINTS, RouteSegment, Stop};

use super::error::EstimateError;

/// Build the route segments from a vehicle's live position to `target_stop_id`.
///
/// The path is the live position followed by every stop from the vehicle's
/// next stop up to and including the first occurrence of the target at or
/// after it. Stops before the next stop have already been passed, so a
/// target that only appears there is `StopNotInPath`.
pub fn plan_route(
    start: Coordinate,
    stops: &[Stop],
    next_stop_id: &str,
    target_stop_id: &str,
) -> Result<Vec<RouteSegment>, EstimateError> {
    let from = stops
        .iter()
        .position(|s| s.id == next_stop_id)
        .ok_or(EstimateError::StopNotInPath)?;

    let ahead = &stops[from..];
    let target = ahead
        .iter()
        .position(|s| s.id == target_stop_id)
        .ok_or(EstimateError::StopNotInPath)?;

    let path: Vec<Coordinate> = iter::once(start)
        .chain(ahead[..=target].iter().map(Stop::coordinate))
        .collect();

    Ok(split_path(&path))
}

/// Cut a path into segments of at most `MAX_WAYPOINTS` points.
///
/// The cut is purely by size; each segment after the first leads in from
/// the previous segment's last point.
pub fn split_path(path: &[Coordinate]) -> Vec<RouteSegment> {
    let mut segments: Vec<RouteSegment> = Vec::with_capacity(path.len().div_ceil(MAX_WAYPOINTS));

    for chunk in path.chunks(MAX_WAYPOINTS) {
        let lead_in = segments.last().and_then(|prev| prev.waypoints.last().copied());
        segments.push(RouteSegment {
            lead_in,
            waypoints: chunk.to_vec(),
        });
    }

    segments
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn stops(n: usize) -> Vec<Stop> {
        (0..n)
            .map(|i| Stop {
                id: format!("s{i}"),
                name: String::new(),
                latitude: 50.0 + i as f64 * 1e-4,
                longitude: 14.0,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn chunks_partition_the_path(len in 1usize..200) {
            let stops = stops(len);
            let start = Coordinate::new(49.0, 14.0);
            let target = format!("s{}", len - 1);

            let segments = plan_route(start, &stops, "s0", &target).unwrap();

            prop_assert_eq!(segments.len(), (len + 1).div_ceil(MAX_WAYPOINTS));

            let mut rebuilt = Vec::new();
            for (i, segment) in segments.iter().enumerate() {
                prop_assert!(!segment.waypoints.is_empty());
                prop_assert!(segment.waypoints.len() <= MAX_WAYPOINTS);
                prop_assert!(segment.request_points().count() <= MAX_WAYPOINTS + 1);

                let expected_lead_in = if i == 0 {
                    None
                } else {
                    segments[i - 1].waypoints.last().copied()
                };
                prop_assert_eq!(segment.lead_in, expected_lead_in);

                rebuilt.extend(segment.waypoints.iter().copied());
            }

            let path: Vec<Coordinate> = iter::once(start)
                .chain(stops.iter().map(Stop::coordinate))
                .collect();
            prop_assert_eq!(rebuilt, path);
        }

        #[test]
        fn targets_behind_the_vehicle_are_rejected(len in 2usize..60, next in 1usize..60) {
            prop_assume!(next < len);
            let stops = stops(len);
            let start = Coordinate::new(49.0, 14.0);
            let next_id = format!("s{next}");

            for behind in 0..next {
                let result = plan_route(start, &stops, &next_id, &format!("s{behind}"));
                prop_assert!(matches!(result, Err(EstimateError::StopNotInPath)));
            }
        }
    }
}
