//! Conversion from Golemio DTOs to domain types.

use tracing::warn;

use crate::domain::{Coordinate, Stop, TripMetadata, VehiclePosition};

use super::types::{GolemioTrip, PositionFeature};

/// Convert a page of position features.
///
/// Vehicles without a trip id or with unparseable coordinates cannot be
/// enriched or routed, so they are skipped with a warning.
pub fn convert_positions(features: Vec<PositionFeature>) -> Vec<VehiclePosition> {
    features
        .into_iter()
        .filter_map(|feature| {
            let props = feature.properties;

            let Some(trip_id) = props.trip.gtfs_trip_id.filter(|id| !id.is_empty()) else {
                warn!("skipping vehicle without trip id");
                return None;
            };

            let position = match Coordinate::parse(&props.last_position.lat, &props.last_position.lng)
            {
                Ok(position) => position,
                Err(e) => {
                    warn!(trip_id = %trip_id, error = %e, "skipping vehicle with bad coordinates");
                    return None;
                }
            };

            Some(VehiclePosition {
                trip_id,
                line: props.trip.cis_short_name.unwrap_or_default(),
                next_stop_id: props.last_position.gtfs_next_stop_id.unwrap_or_default(),
                position,
                delay_secs: props.last_position.delay.unwrap_or(0),
            })
        })
        .collect()
}

/// Convert a trip response, keeping stop order.
pub fn convert_trip(trip: GolemioTrip) -> TripMetadata {
    TripMetadata {
        trip_id: trip.trip_id,
        stops: trip
            .stops
            .into_iter()
            .map(|s| Stop {
                id: s.properties.stop_id,
                name: s.properties.stop_name,
                latitude: s.properties.stop_lat,
                longitude: s.properties.stop_lon,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golemio::types::PositionResponse;

    const PAGE: &str = r#"{
        "features": [
            {"properties": {
                "trip": {"gtfs_trip_id": "115_9_201230", "cis_short_name": "115"},
                "last_position": {"gtfs_next_stop_id": "U52Z2P", "lat": "50.03119", "lng": "14.49122", "delay": 120}
            }},
            {"properties": {
                "trip": {"gtfs_trip_id": null, "cis_short_name": "901"},
                "last_position": {"gtfs_next_stop_id": "U1Z1", "lat": "50.0", "lng": "14.0", "delay": 0}
            }},
            {"properties": {
                "trip": {"gtfs_trip_id": "177_2_201230", "cis_short_name": "177"},
                "last_position": {"gtfs_next_stop_id": "U9Z1", "lat": "", "lng": "14.0", "delay": null}
            }},
            {"properties": {
                "trip": {"gtfs_trip_id": "136_4_201230", "cis_short_name": null},
                "last_position": {"gtfs_next_stop_id": null, "lat": "50.1", "lng": "14.5", "delay": null}
            }}
        ]
    }"#;

    #[test]
    fn converts_and_skips_unusable_vehicles() {
        let page: PositionResponse = serde_json::from_str(PAGE).unwrap();
        let positions = convert_positions(page.features);

        assert_eq!(positions.len(), 2);

        assert_eq!(positions[0].trip_id, "115_9_201230");
        assert_eq!(positions[0].line, "115");
        assert_eq!(positions[0].next_stop_id, "U52Z2P");
        assert_eq!(positions[0].position, Coordinate::new(50.03119, 14.49122));
        assert_eq!(positions[0].delay_secs, 120);

        assert_eq!(positions[1].trip_id, "136_4_201230");
        assert_eq!(positions[1].line, "");
        assert_eq!(positions[1].next_stop_id, "");
        assert_eq!(positions[1].delay_secs, 0);
    }

    #[test]
    fn converts_trip_in_order() {
        let json = r#"{
            "trip_id": "115_9_201230",
            "stops": [
                {"properties": {"stop_id": "U1", "stop_name": "Chodov", "stop_lat": 50.031, "stop_lon": 14.491}},
                {"properties": {"stop_id": "U2", "stop_name": "Roztyly", "stop_lat": 50.037, "stop_lon": 14.478}}
            ]
        }"#;
        let trip: GolemioTrip = serde_json::from_str(json).unwrap();
        let trip = convert_trip(trip);

        assert_eq!(trip.trip_id, "115_9_201230");
        assert_eq!(trip.stops.len(), 2);
        assert_eq!(trip.stops[0].id, "U1");
        assert_eq!(trip.stops[1].name, "Roztyly");
        assert_eq!(trip.stops[1].latitude, 50.037);
    }
}
