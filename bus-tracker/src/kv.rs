//! Key-value backing store for cached feed data.
//!
//! The pipeline only needs string get/set with no expiry. Entries are
//! serialized JSON blobs; what a key means is up to the caller.
//!
//! Two backends: [`MemoryStore`] keeps everything in process, [`RedisStore`]
//! keeps it in Redis so cached snapshots and trips survive restarts and can
//! be shared between instances.

use std::future::Future;

use moka::future::Cache as MokaCache;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

/// Errors from the backing store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// String-keyed get/set store.
pub trait KvStore: Send + Sync + 'static {
    /// Read a value. `Ok(None)` means the key is not set.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Configuration for the in-process store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of stored entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 100_000,
        }
    }
}

/// In-process store backed by a moka cache.
///
/// Entries never expire; the capacity bound only matters when far more trips
/// are seen than a day's timetable holds.
pub struct MemoryStore {
    entries: MokaCache<String, String>,
}

impl MemoryStore {
    /// Create a new store with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self { entries }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value).await;
        Ok(())
    }
}

/// Store backed by a Redis server.
///
/// Uses a connection manager, which reconnects on its own after the server
/// goes away; requests made while it is down fail with
/// [`StoreError::Unavailable`].
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the server at `url` (`redis://[:password@]host[:port][/db]`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("redis connection established");

        Ok(Self { conn })
    }
}

impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let () = conn.set(key, value).await?;
        Ok(())
    }
}
