//! Mock Golemio feed for running and testing without API access.
//!
//! Serves positions and trips held in memory, optionally loaded from a
//! directory of JSON files in the feed's own format. Every trip fetch is
//! counted, and trips can be made slow or failing.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::{TripMetadata, VehiclePosition};
use crate::positions::{PositionPage, PositionSource};
use crate::trips::TripSource;

use super::convert::{convert_positions, convert_trip};
use super::error::FeedError;
use super::types::{GolemioTrip, PositionResponse};

/// File holding the position feed inside a mock data directory.
const POSITIONS_FILE: &str = "positions.json";

#[derive(Default)]
struct MockState {
    positions: RwLock<Vec<VehiclePosition>>,
    trips: RwLock<HashMap<String, TripMetadata>>,
    failing_trips: RwLock<HashSet<String>>,
    trip_delays: RwLock<HashMap<String, Duration>>,
    trip_fetches: RwLock<HashMap<String, usize>>,
    page_fetches: AtomicUsize,
    pages_in_flight: AtomicUsize,
    max_pages_in_flight: AtomicUsize,
    positions_delay_ms: AtomicU64,
    positions_down: AtomicBool,
}

/// In-memory stand-in for the Golemio API.
#[derive(Clone, Default)]
pub struct MockFeed {
    state: Arc<MockState>,
}

impl MockFeed {
    /// Create an empty mock feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load mock data from a directory.
    ///
    /// Expects `positions.json` (a `vehiclepositions` response) and any
    /// number of other `*.json` files, each a `gtfs/trips/{id}` response.
    pub async fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref();
        let feed = Self::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| FeedError::MockData {
            message: format!("failed to read {}: {e}", data_dir.display()),
        })?;

        let mut found_positions = false;

        for entry in entries {
            let entry = entry.map_err(|e| FeedError::MockData {
                message: format!("failed to read directory entry: {e}"),
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let json = std::fs::read_to_string(&path).map_err(|e| FeedError::MockData {
                message: format!("failed to read {}: {e}", path.display()),
            })?;

            if path.file_name().and_then(|s| s.to_str()) == Some(POSITIONS_FILE) {
                let page: PositionResponse =
                    serde_json::from_str(&json).map_err(|e| FeedError::MockData {
                        message: format!("failed to parse {}: {e}", path.display()),
                    })?;
                feed.set_positions(convert_positions(page.features)).await;
                found_positions = true;
            } else {
                let trip: GolemioTrip =
                    serde_json::from_str(&json).map_err(|e| FeedError::MockData {
                        message: format!("failed to parse {}: {e}", path.display()),
                    })?;
                feed.insert_trip(convert_trip(trip)).await;
            }
        }

        if !found_positions {
            return Err(FeedError::MockData {
                message: format!("no {POSITIONS_FILE} in {}", data_dir.display()),
            });
        }

        Ok(feed)
    }

    /// Replace the served positions.
    pub async fn set_positions(&self, positions: Vec<VehiclePosition>) {
        *self.state.positions.write().await = positions;
    }

    /// Add or replace a trip.
    pub async fn insert_trip(&self, trip: TripMetadata) {
        self.state
            .trips
            .write()
            .await
            .insert(trip.trip_id.clone(), trip);
    }

    /// Make every fetch of `trip_id` fail.
    pub async fn fail_trip(&self, trip_id: &str) {
        self.state
            .failing_trips
            .write()
            .await
            .insert(trip_id.to_string());
    }

    /// Delay every fetch of `trip_id`.
    pub async fn delay_trip(&self, trip_id: &str, delay: Duration) {
        self.state
            .trip_delays
            .write()
            .await
            .insert(trip_id.to_string(), delay);
    }

    /// Delay every position page fetch.
    pub fn delay_positions(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.positions_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Make position fetches fail (or recover).
    pub fn set_positions_down(&self, down: bool) {
        self.state.positions_down.store(down, Ordering::SeqCst);
    }

    /// Number of upstream fetches made for `trip_id`.
    pub async fn trip_fetch_count(&self, trip_id: &str) -> usize {
        self.state
            .trip_fetches
            .read()
            .await
            .get(trip_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of upstream trip fetches made in total.
    pub async fn total_trip_fetches(&self) -> usize {
        self.state.trip_fetches.read().await.values().sum()
    }

    /// Most position page fetches ever running at the same time.
    pub fn max_concurrent_page_fetches(&self) -> usize {
        self.state.max_pages_in_flight.load(Ordering::SeqCst)
    }

    /// Number of position pages served.
    pub fn page_fetch_count(&self) -> usize {
        self.state.page_fetches.load(Ordering::SeqCst)
    }
}

impl PositionSource for MockFeed {
    async fn fetch_positions(&self, limit: usize, offset: usize) -> Result<PositionPage, FeedError> {
        self.state.page_fetches.fetch_add(1, Ordering::SeqCst);

        let in_flight = self.state.pages_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_pages_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.state.positions_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.state.pages_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.state.positions_down.load(Ordering::SeqCst) {
            return Err(FeedError::Api {
                status: 503,
                message: "mock positions unavailable".to_string(),
            });
        }

        let positions = self.state.positions.read().await;
        let page: Vec<VehiclePosition> = positions.iter().skip(offset).take(limit).cloned().collect();

        Ok(PositionPage {
            received: page.len(),
            positions: page,
        })
    }
}

impl TripSource for MockFeed {
    async fn fetch_trip(&self, trip_id: &str) -> Result<TripMetadata, FeedError> {
        *self
            .state
            .trip_fetches
            .write()
            .await
            .entry(trip_id.to_string())
            .or_insert(0) += 1;

        let delay = self.state.trip_delays.read().await.get(trip_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.failing_trips.read().await.contains(trip_id) {
            return Err(FeedError::Api {
                status: 500,
                message: format!("mock failure for trip {trip_id}"),
            });
        }

        self.state
            .trips
            .read()
            .await
            .get(trip_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("trip {trip_id}")))
    }
}
