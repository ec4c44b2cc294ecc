//! Cached snapshot of current vehicle positions.
//!
//! The whole position feed is fetched page by page and stored as one JSON
//! blob under `lastposition`, with the fetch time under `lastsynctimestamp`.
//! Refreshes are serialized by one lock. Within a refresh the two keys are
//! written one after the other, so a reader may briefly see a new snapshot
//! with the previous timestamp, which is acceptable for data that is
//! refreshed every few seconds anyway.
//!
//! Every refresh also kicks off a detached pre-warm of the trip store for all
//! trips in the new snapshot, so later enrichment mostly hits the cache.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Snapshot, VehiclePosition};
use crate::golemio::FeedError;
use crate::kv::{KvStore, StoreError};
use crate::trips::{TripSource, TripStore};

/// KV key holding the serialized snapshot.
pub const SNAPSHOT_KEY: &str = "lastposition";

/// KV key holding the snapshot's unix timestamp.
pub const SYNC_TIMESTAMP_KEY: &str = "lastsynctimestamp";

/// One page of the position feed.
#[derive(Debug, Clone, Default)]
pub struct PositionPage {
    /// Usable positions on this page.
    pub positions: Vec<VehiclePosition>,

    /// Number of records the feed returned, including ones that were
    /// discarded during conversion. Drives pagination.
    pub received: usize,
}

/// Upstream source of vehicle positions.
pub trait PositionSource: Send + Sync + 'static {
    /// Fetch up to `limit` positions starting at `offset`.
    fn fetch_positions(
        &self,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<PositionPage, FeedError>> + Send;
}

/// Errors from reading or refreshing the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("position fetch failed: {0}")]
    Feed(#[from] FeedError),

    #[error("snapshot cache failed: {0}")]
    Store(#[from] StoreError),

    #[error("cached snapshot is corrupt: {message}")]
    Corrupt { message: String },
}

/// Configuration for snapshot fetching.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Records requested per page.
    pub page_size: usize,

    /// Maximum concurrent trip fetches while pre-warming.
    pub prewarm_concurrency: usize,
}

impl SnapshotConfig {
    /// Set the page size (at least 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the pre-warm concurrency (at least 1).
    pub fn with_prewarm_concurrency(mut self, n: usize) -> Self {
        self.prewarm_concurrency = n.max(1);
        self
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            prewarm_concurrency: 32,
        }
    }
}

/// Position fetcher with a cache-aside snapshot.
pub struct PositionCache<K, F> {
    kv: Arc<K>,
    feed: Arc<F>,
    trips: Arc<TripStore<K, F>>,
    refresh_lock: Mutex<()>,
    config: SnapshotConfig,
}

impl<K, F> PositionCache<K, F>
where
    K: KvStore,
    F: PositionSource + TripSource,
{
    /// Create a new position cache over `kv`, fetching from `feed`.
    pub fn new(
        kv: Arc<K>,
        feed: Arc<F>,
        trips: Arc<TripStore<K, F>>,
        config: SnapshotConfig,
    ) -> Self {
        Self {
            kv,
            feed,
            trips,
            refresh_lock: Mutex::new(()),
            config,
        }
    }

    /// Fetch the full feed, replace the cached snapshot and pre-warm trips.
    ///
    /// Refreshes run one at a time, so the two keys are never written by
    /// overlapping refreshes. On failure the previous snapshot is left in
    /// place.
    pub async fn refresh_snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh body; the caller holds `refresh_lock`.
    async fn refresh_locked(&self) -> Result<Snapshot, SnapshotError> {
        let vehicles = self.fetch_all().await?;
        let synced_at = Utc::now().timestamp();

        let blob = serde_json::to_string(&vehicles).map_err(|e| SnapshotError::Corrupt {
            message: e.to_string(),
        })?;
        self.kv.set(SNAPSHOT_KEY, blob).await?;
        self.kv
            .set(SYNC_TIMESTAMP_KEY, synced_at.to_string())
            .await?;

        let snapshot = Snapshot {
            vehicles,
            synced_at,
        };
        info!(vehicles = snapshot.vehicles.len(), synced_at, "position snapshot refreshed");

        self.spawn_prewarm(snapshot.trip_ids());

        Ok(snapshot)
    }

    /// Read the cached snapshot, refreshing it if there is none yet.
    ///
    /// Only one caller refreshes an empty cache; the others wait and then
    /// read what it stored.
    pub async fn get_snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let blob = match self.kv.get(SNAPSHOT_KEY).await? {
            Some(blob) => blob,
            None => {
                let _guard = self.refresh_lock.lock().await;
                match self.kv.get(SNAPSHOT_KEY).await? {
                    Some(blob) => blob,
                    None => {
                        debug!("no cached snapshot, refreshing");
                        return self.refresh_locked().await;
                    }
                }
            }
        };

        let vehicles: Vec<VehiclePosition> =
            serde_json::from_str(&blob).map_err(|e| SnapshotError::Corrupt {
                message: e.to_string(),
            })?;

        Ok(Snapshot {
            vehicles,
            synced_at: self.cached_timestamp().await,
        })
    }

    /// Timestamp of the cached snapshot, or 0 if it is missing.
    async fn cached_timestamp(&self) -> i64 {
        match self.kv.get(SYNC_TIMESTAMP_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                warn!(raw = %raw, "unparseable snapshot timestamp");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "failed to read snapshot timestamp");
                0
            }
        }
    }

    async fn fetch_all(&self) -> Result<Vec<VehiclePosition>, FeedError> {
        let page_size = self.config.page_size.max(1);
        let mut vehicles = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.feed.fetch_positions(page_size, offset).await?;
            vehicles.extend(page.positions);

            if page.received < page_size {
                break;
            }
            offset += page_size;
        }

        Ok(vehicles)
    }

    fn spawn_prewarm(&self, trip_ids: Vec<String>) {
        if trip_ids.is_empty() {
            return;
        }

        let trips = Arc::clone(&self.trips);
        let concurrency = self.config.prewarm_concurrency.max(1);

        tokio::spawn(async move {
            let total = trip_ids.len();
            stream::iter(trip_ids)
                .for_each_concurrent(concurrency, move |trip_id| {
                    let trips = Arc::clone(&trips);
                    async move {
                        if let Err(e) = trips.get_trip(&trip_id).await {
                            warn!(trip_id = %trip_id, error = %e, "trip pre-warm failed");
                        }
                    }
                })
                .await;
            debug!(trips = total, "trip pre-warm finished");
        });
    }
}
