//! Joins the position snapshot with trip metadata.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use crate::domain::{EnrichedVehicle, TripMetadata};
use crate::kv::KvStore;
use crate::positions::{PositionCache, PositionSource, SnapshotError};
use crate::trips::{TripSource, TripStore};

/// Enriched vehicles for one snapshot.
#[derive(Debug, Clone)]
pub struct BusInfo {
    /// Vehicles in snapshot order. Vehicles whose trip could not be
    /// resolved are left out.
    pub vehicles: Vec<EnrichedVehicle>,

    /// Unix timestamp of the snapshot.
    pub sync_timestamp: i64,
}

/// Produces enriched vehicle lists.
pub struct BusInfoAssembler<K, F> {
    positions: Arc<PositionCache<K, F>>,
    trips: Arc<TripStore<K, F>>,
}

impl<K, F> BusInfoAssembler<K, F>
where
    K: KvStore,
    F: PositionSource + TripSource,
{
    /// Create a new assembler.
    pub fn new(positions: Arc<PositionCache<K, F>>, trips: Arc<TripStore<K, F>>) -> Self {
        Self { positions, trips }
    }

    /// Enrich every vehicle in the current snapshot.
    ///
    /// Trip lookups run as one task per vehicle. Each task reports its
    /// snapshot index, so the result order does not depend on which lookup
    /// finishes first.
    pub async fn get_current_bus_info(&self) -> Result<BusInfo, SnapshotError> {
        let snapshot = self.positions.get_snapshot().await?;

        let mut tasks = JoinSet::new();
        for (index, vehicle) in snapshot.vehicles.iter().enumerate() {
            let trips = Arc::clone(&self.trips);
            let trip_id = vehicle.trip_id.clone();

            tasks.spawn(async move {
                match trips.get_trip(&trip_id).await {
                    Ok(trip) => (index, Some(trip)),
                    Err(e) => {
                        warn!(trip_id = %trip_id, error = %e, "dropping vehicle, trip lookup failed");
                        (index, None)
                    }
                }
            });
        }

        let mut resolved: Vec<Option<Arc<TripMetadata>>> = vec![None; snapshot.vehicles.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, trip)) => resolved[index] = trip,
                Err(e) => warn!(error = %e, "trip lookup task did not complete"),
            }
        }

        let vehicles = snapshot
            .vehicles
            .iter()
            .zip(resolved)
            .filter_map(|(position, trip)| trip.map(|trip| EnrichedVehicle::join(position, &trip)))
            .collect();

        Ok(BusInfo {
            vehicles,
            sync_timestamp: snapshot.synced_at,
        })
    }

    /// Look up one enriched vehicle by its stable id.
    pub async fn find_vehicle(&self, bus_id: &str) -> Result<Option<EnrichedVehicle>, SnapshotError> {
        let info = self.get_current_bus_info().await?;
        Ok(info.vehicles.into_iter().find(|v| v.id == bus_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, Stop, VehiclePosition, vehicle_id};
    use crate::golemio::MockFeed;
    use crate::kv::MemoryStore;
    use crate::positions::SnapshotConfig;
    use std::time::Duration;

    fn position(trip_id: &str, next_stop: &str) -> VehiclePosition {
        VehiclePosition {
            trip_id: trip_id.to_string(),
            line: format!("L{trip_id}"),
            next_stop_id: next_stop.to_string(),
            position: Coordinate::new(50.0, 14.0),
            delay_secs: 60,
        }
    }

    fn trip(id: &str, stops: &[(&str, &str)]) -> TripMetadata {
        TripMetadata {
            trip_id: id.to_string(),
            stops: stops
                .iter()
                .enumerate()
                .map(|(i, (stop_id, name))| Stop {
                    id: stop_id.to_string(),
                    name: name.to_string(),
                    latitude: 50.0 + i as f64 * 0.01,
                    longitude: 14.0,
                })
                .collect(),
        }
    }

    fn assembler(
        kv: Arc<MemoryStore>,
        feed: &MockFeed,
    ) -> BusInfoAssembler<MemoryStore, MockFeed> {
        let feed = Arc::new(feed.clone());
        let trips = Arc::new(TripStore::new(Arc::clone(&kv), Arc::clone(&feed)));
        let positions = Arc::new(PositionCache::new(
            kv,
            feed,
            Arc::clone(&trips),
            SnapshotConfig::default(),
        ));
        BusInfoAssembler::new(positions, trips)
    }

    #[tokio::test]
    async fn enriches_vehicles() {
        let feed = MockFeed::new();
        feed.set_positions(vec![position("t1", "b")]).await;
        feed.insert_trip(trip("t1", &[("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")]))
            .await;
        let assembler = assembler(Arc::new(MemoryStore::default()), &feed);

        let info = assembler.get_current_bus_info().await.unwrap();

        assert_eq!(info.vehicles.len(), 1);
        let v = &info.vehicles[0];
        assert_eq!(v.id, vehicle_id("t1"));
        assert_eq!(v.line, "Lt1");
        assert_eq!(v.next_stop_name, "Beta");
        assert_eq!(v.last_stop_name, "Gamma");
        assert_eq!(v.delay, 1.0);
        assert!(info.sync_timestamp > 0);
    }

    #[tokio::test]
    async fn vehicles_with_failed_trips_are_dropped() {
        let feed = MockFeed::new();
        feed.set_positions(vec![
            position("t1", "a"),
            position("broken", "a"),
            position("unknown", "a"),
            position("t2", "a"),
        ])
        .await;
        feed.insert_trip(trip("t1", &[("a", "Alpha")])).await;
        feed.insert_trip(trip("t2", &[("a", "Alpha")])).await;
        feed.insert_trip(trip("broken", &[("a", "Alpha")])).await;
        feed.fail_trip("broken").await;
        let assembler = assembler(Arc::new(MemoryStore::default()), &feed);

        let info = assembler.get_current_bus_info().await.unwrap();

        let ids: Vec<_> = info.vehicles.iter().map(|v| v.id.clone()).collect();
        assert_eq!(ids, vec![vehicle_id("t1"), vehicle_id("t2")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn output_follows_snapshot_order_not_completion_order() {
        let feed = MockFeed::new();
        let count = 8;
        let trip_ids: Vec<String> = (0..count).map(|i| format!("t{i}")).collect();

        feed.set_positions(trip_ids.iter().map(|id| position(id, "a")).collect())
            .await;
        for (i, id) in trip_ids.iter().enumerate() {
            feed.insert_trip(trip(id, &[("a", "Alpha")])).await;
            // Earlier vehicles finish last.
            feed.delay_trip(id, Duration::from_millis(10 * (count - i) as u64))
                .await;
        }

        let kv = Arc::new(MemoryStore::default());
        // Fill the snapshot directly so the refresh pre-warm does not race
        // the lookups under test.
        let blob = serde_json::to_string(&trip_ids.iter().map(|id| position(id, "a")).collect::<Vec<_>>())
            .unwrap();
        kv.set(crate::positions::SNAPSHOT_KEY, blob).await.unwrap();
        let assembler = assembler(kv, &feed);

        let info = assembler.get_current_bus_info().await.unwrap();

        let expected: Vec<String> = trip_ids.iter().map(|id| vehicle_id(id)).collect();
        let actual: Vec<String> = info.vehicles.iter().map(|v| v.id.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn cached_snapshot_round_trip_gives_same_vehicles() {
        let feed = MockFeed::new();
        feed.set_positions(vec![position("t1", "b"), position("t2", "a")]).await;
        feed.insert_trip(trip("t1", &[("a", "Alpha"), ("b", "Beta")])).await;
        feed.insert_trip(trip("t2", &[("a", "Alpha"), ("b", "Beta")])).await;

        let kv = Arc::new(MemoryStore::default());
        let fresh = assembler(Arc::clone(&kv), &feed);
        let first = fresh.get_current_bus_info().await.unwrap();

        // A new assembler over the same store, with the feed emptied, must
        // rebuild the same view from the cached snapshot alone.
        feed.set_positions(vec![]).await;
        let from_cache = assembler(kv, &feed);
        let second = from_cache.get_current_bus_info().await.unwrap();

        assert_eq!(first.vehicles, second.vehicles);
        assert_eq!(first.sync_timestamp, second.sync_timestamp);
    }

    #[tokio::test]
    async fn find_vehicle_by_id() {
        let feed = MockFeed::new();
        feed.set_positions(vec![position("t1", "a")]).await;
        feed.insert_trip(trip("t1", &[("a", "Alpha")])).await;
        let assembler = assembler(Arc::new(MemoryStore::default()), &feed);

        let found = assembler.find_vehicle(&vehicle_id("t1")).await.unwrap();
        assert!(found.is_some());
        assert!(assembler.find_vehicle("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_snapshot_gives_empty_list() {
        let feed = MockFeed::new();
        let assembler = assembler(Arc::new(MemoryStore::default()), &feed);

        let info = assembler.get_current_bus_info().await.unwrap();
        assert!(info.vehicles.is_empty());
    }
}
