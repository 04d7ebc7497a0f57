//! In-memory TTL cache shared by the remote API clients.
//!
//! Entries are keyed by a logical resource name and carry their own
//! time-to-live. An expired entry is a miss for [`TtlCache::get_or_cache`],
//! but stays readable through [`TtlCache::get_stale`] so callers can degrade
//! to the last good payload when a live fetch fails.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Cloneable handle to a keyed TTL store.
///
/// Clones share the same underlying map.
#[derive(Clone, Debug)]
pub struct TtlCache<V> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the value for `key` if it is still within its TTL.
    pub fn get_fresh(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Return the last stored value for `key`, expired or not.
    pub fn get_stale(&self, key: &str) -> Option<V> {
        self.lock().get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.lock().insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Return the cached value when fresh, otherwise run `producer`, store
    /// its output under `key` with `ttl`, and return it.
    ///
    /// Producer errors are returned untouched and nothing is stored; the
    /// previous entry (if any) stays available to [`Self::get_stale`].
    pub async fn get_or_cache<F, Fut, E>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get_fresh(key) {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        debug!("Cache miss for {}, fetching", key);
        let value = producer().await?;
        self.insert(key, value.clone(), ttl);
        Ok(value)
    }

    /// Drop a single entry.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
