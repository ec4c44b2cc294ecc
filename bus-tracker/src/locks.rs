//! Per-key async locks for single-flight fetches.
//!
//! Each key maps to a weak handle on a shared `tokio::sync::Mutex`. As long
//! as any task holds or waits on a key's lock, every other caller for that key
//! gets the same mutex. Once all handles are dropped the entry is dead and is
//! removed on the next prune, so the pool only grows with the number of keys
//! currently in use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Pool size below which dead entries are left alone.
const MIN_PRUNE_THRESHOLD: usize = 1024;

struct Pool {
    entries: HashMap<String, Weak<AsyncMutex<()>>>,
    prune_at: usize,
}

impl Pool {
    fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, lock| lock.strong_count() > 0);
        before - self.entries.len()
    }
}

/// Lazily populated pool of per-key locks.
pub struct KeyedLocks {
    pool: Mutex<Pool>,
}

impl KeyedLocks {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(Pool {
                entries: HashMap::new(),
                prune_at: MIN_PRUNE_THRESHOLD,
            }),
        }
    }

    /// Get the shared lock for `key`, creating it if no live one exists.
    ///
    /// The pool mutex is only held for the map lookup/insert.
    pub fn handle(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(lock) = pool.entries.get(key).and_then(Weak::upgrade) {
            return lock;
        }

        let lock = Arc::new(AsyncMutex::new(()));
        pool.entries.insert(key.to_string(), Arc::downgrade(&lock));

        if pool.entries.len() >= pool.prune_at {
            let removed = pool.prune();
            pool.prune_at = (pool.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
            debug!(removed, remaining = pool.entries.len(), "pruned key lock pool");
        }

        lock
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        self.handle(key).lock_owned().await
    }

    /// Remove entries no task is using. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        pool.prune()
    }

    /// Number of entries in the pool, live or dead.
    pub fn len(&self) -> usize {
        let pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        pool.entries.len()
    }

    /// Whether the pool has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new()
    }
}
