//! Cache-aside trip store with single-flight fetches.
//!
//! Trip stop lists change rarely but are needed for every vehicle on every
//! request. They are cached in the KV store under `trip_{id}`. A per-trip lock
//! is held across the cache check and the upstream fetch, so concurrent
//! callers for one trip wait for a single fetch and then read its cached
//! result. Lookups for different trips never wait on each other.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::TripMetadata;
use crate::golemio::FeedError;
use crate::kv::{KvStore, StoreError};
use crate::locks::KeyedLocks;

/// Upstream source of trip metadata.
pub trait TripSource: Send + Sync + 'static {
    /// Fetch one trip with its ordered stops.
    fn fetch_trip(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<TripMetadata, FeedError>> + Send;
}

/// Errors from a trip lookup.
#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error("trip fetch failed: {0}")]
    Feed(#[from] FeedError),

    #[error("trip cache failed: {0}")]
    Store(#[from] StoreError),
}

/// KV key for a trip's cached metadata.
pub fn trip_key(trip_id: &str) -> String {
    format!("trip_{trip_id}")
}

/// Trip metadata accessor backed by a KV store.
pub struct TripStore<K, S> {
    kv: Arc<K>,
    source: Arc<S>,
    locks: KeyedLocks,
}

impl<K: KvStore, S: TripSource> TripStore<K, S> {
    /// Create a new trip store caching `source` in `kv`.
    pub fn new(kv: Arc<K>, source: Arc<S>) -> Self {
        Self {
            kv,
            source,
            locks: KeyedLocks::new(),
        }
    }

    /// Get a trip, fetching and caching it on a miss.
    ///
    /// Failed fetches are returned to the caller and not cached, so the next
    /// lookup tries upstream again.
    pub async fn get_trip(&self, trip_id: &str) -> Result<Arc<TripMetadata>, TripError> {
        let key = trip_key(trip_id);
        let _guard = self.locks.lock(trip_id).await;

        if let Some(trip) = self.cached(trip_id, &key).await {
            return Ok(Arc::new(trip));
        }

        debug!(trip_id, "trip cache miss, fetching");
        let trip = self.source.fetch_trip(trip_id).await?;

        match serde_json::to_string(&trip) {
            Ok(blob) => {
                if let Err(e) = self.kv.set(&key, blob).await {
                    warn!(trip_id, error = %e, "failed to cache trip");
                }
            }
            Err(e) => warn!(trip_id, error = %e, "failed to serialize trip"),
        }

        Ok(Arc::new(trip))
    }

    /// Read a cached trip. Store errors and corrupt blobs count as a miss.
    async fn cached(&self, trip_id: &str, key: &str) -> Option<TripMetadata> {
        let blob = match self.kv.get(key).await {
            Ok(blob) => blob?,
            Err(e) => {
                warn!(trip_id, error = %e, "trip cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(trip) => Some(trip),
            Err(e) => {
                warn!(trip_id, error = %e, "discarding corrupt cached trip");
                None
            }
        }
    }

    /// Drop per-trip locks no task is using.
    pub fn prune_locks(&self) -> usize {
        self.locks.prune()
    }

    /// Number of per-trip locks currently tracked.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stop;
    use crate::golemio::MockFeed;
    use crate::kv::MemoryStore;
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn trip(id: &str, stops: usize) -> TripMetadata {
        TripMetadata {
            trip_id: id.to_string(),
            stops: (0..stops)
                .map(|i| Stop {
                    id: format!("{id}-s{i}"),
                    name: format!("Stop {i}"),
                    latitude: 50.0 + i as f64 * 0.01,
                    longitude: 14.0,
                })
                .collect(),
        }
    }

    fn store(feed: &MockFeed) -> (Arc<MemoryStore>, TripStore<MemoryStore, MockFeed>) {
        let kv = Arc::new(MemoryStore::default());
        let store = TripStore::new(Arc::clone(&kv), Arc::new(feed.clone()));
        (kv, store)
    }

    /// Store that fails every operation.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[test]
    fn key_format() {
        assert_eq!(trip_key("115_9_201230"), "trip_115_9_201230");
    }

    #[tokio::test]
    async fn miss_fetches_and_caches() {
        let feed = MockFeed::new();
        feed.insert_trip(trip("t1", 3)).await;
        let (kv, store) = store(&feed);

        let first = store.get_trip("t1").await.unwrap();
        let second = store.get_trip("t1").await.unwrap();

        assert_eq!(first.stops.len(), 3);
        assert_eq!(first, second);
        assert_eq!(feed.trip_fetch_count("t1").await, 1);
        assert!(kv.get("trip_t1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let feed = MockFeed::new();
        let (kv, store) = store(&feed);

        assert!(matches!(
            store.get_trip("t1").await,
            Err(TripError::Feed(FeedError::NotFound(_)))
        ));
        assert!(kv.get("trip_t1").await.unwrap().is_none());

        feed.insert_trip(trip("t1", 2)).await;
        assert!(store.get_trip("t1").await.is_ok());
        assert_eq!(feed.trip_fetch_count("t1").await, 2);
    }

    #[tokio::test]
    async fn corrupt_cache_entry_is_refetched() {
        let feed = MockFeed::new();
        feed.insert_trip(trip("t1", 2)).await;
        let (kv, store) = store(&feed);
        kv.set("trip_t1", "{not json".to_string()).await.unwrap();

        let trip = store.get_trip("t1").await.unwrap();

        assert_eq!(trip.stops.len(), 2);
        assert_eq!(feed.trip_fetch_count("t1").await, 1);
        let repaired = kv.get("trip_t1").await.unwrap().unwrap();
        assert!(serde_json::from_str::<TripMetadata>(&repaired).is_ok());
    }

    #[tokio::test]
    async fn broken_store_still_serves_trips() {
        let feed = MockFeed::new();
        feed.insert_trip(trip("t1", 2)).await;
        let store = TripStore::new(Arc::new(BrokenStore), Arc::new(feed.clone()));

        assert!(store.get_trip("t1").await.is_ok());
        assert!(store.get_trip("t1").await.is_ok());
        assert_eq!(feed.trip_fetch_count("t1").await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_fetch_once() {
        let feed = MockFeed::new();
        feed.insert_trip(trip("t1", 5)).await;
        feed.delay_trip("t1", Duration::from_millis(50)).await;
        let (_kv, store) = store(&feed);
        let store = Arc::new(store);

        let mut tasks = JoinSet::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            tasks.spawn(async move { store.get_trip("t1").await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().stops.len(), 5);
        }

        assert_eq!(feed.trip_fetch_count("t1").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn slow_trip_does_not_block_other_trips() {
        let feed = MockFeed::new();
        feed.insert_trip(trip("slow", 1)).await;
        feed.insert_trip(trip("fast", 1)).await;
        feed.delay_trip("slow", Duration::from_secs(5)).await;
        let (_kv, store) = store(&feed);
        let store = Arc::new(store);

        let slow_store = Arc::clone(&store);
        let slow = tokio::spawn(async move { slow_store.get_trip("slow").await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = tokio::time::timeout(Duration::from_secs(1), store.get_trip("fast")).await;
        assert!(fast.is_ok());

        slow.abort();
    }

    #[tokio::test]
    async fn locks_are_pruned_after_use() {
        let feed = MockFeed::new();
        feed.insert_trip(trip("t1", 1)).await;
        feed.insert_trip(trip("t2", 1)).await;
        let (_kv, store) = store(&feed);

        store.get_trip("t1").await.unwrap();
        store.get_trip("t2").await.unwrap();

        assert_eq!(store.lock_count(), 2);
        assert_eq!(store.prune_locks(), 2);
        assert_eq!(store.lock_count(), 0);
    }
}
