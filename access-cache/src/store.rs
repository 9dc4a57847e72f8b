//! Generic TTL cache with stale fallback.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use access_core::error::{AccessError, Result};
use access_core::{CacheBackend, CacheOrigin, Clock};

use crate::backend::{FileBackend, MemoryBackend};
use crate::clock::SystemClock;

/// Persisted cache entry: `{ "timestamp": <epoch-millis>, "data": ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// When `data` was stored (epoch millis)
    pub timestamp: i64,
    /// The transformed payload
    pub data: T,
}

#[derive(Serialize)]
struct CacheEntryRef<'a, T> {
    timestamp: i64,
    data: &'a T,
}

/// A value plus where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<T> {
    /// The value
    pub value: T,
    /// How it was obtained
    pub origin: CacheOrigin,
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from a fresh entry
    pub hits: u64,
    /// Fetched and stored
    pub refreshes: u64,
    /// Fetch failed, expired entry served
    pub stale_fallbacks: u64,
    /// Fetch failed, empty default served
    pub defaults: u64,
    /// Undecodable entries deleted
    pub malformed_evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    refreshes: AtomicU64,
    stale_fallbacks: AtomicU64,
    defaults: AtomicU64,
    malformed_evictions: AtomicU64,
}

/// TTL cache over a pluggable backend.
///
/// Holds at most one entry per key; every successful refresh overwrites it.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl CacheStore {
    /// Creates a store over `backend` using the system clock.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Creates a store with a custom clock.
    pub fn with_clock(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            counters: Counters::default(),
        }
    }

    /// Creates a throwaway in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Creates a store persisting one JSON file per key under `dir`.
    pub fn on_disk(dir: impl AsRef<std::path::Path>) -> Self {
        Self::new(Arc::new(FileBackend::new(dir)))
    }

    /// Current time according to the store's clock.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Returns the cached value for `key`, fetching on miss or expiry.
    ///
    /// See [`CacheStore::fetch_with_cache_outcome`] for the full contract.
    pub async fn fetch_with_cache<T, R, F, Fut, X>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
        transform: X,
    ) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R>>,
        X: FnOnce(Option<R>) -> T,
    {
        self.fetch_with_cache_outcome(key, ttl, fetcher, transform)
            .await
            .value
    }

    /// Returns the cached value for `key` along with its origin.
    ///
    /// 1. A well-formed entry younger than `ttl` is returned as-is; `fetcher` is not called.
    /// 2. Otherwise `fetcher` runs. On success its payload goes through
    ///    `transform(Some(raw))`, is stored with the current timestamp, and returned.
    /// 3. If `fetcher` fails, an existing entry is returned unchanged however old it is.
    /// 4. With nothing stored, `transform(None)` supplies the default.
    ///
    /// Malformed entries are deleted and count as a miss. Errors never escape.
    #[instrument(skip(self, fetcher, transform), fields(ttl_ms = ttl.as_millis() as u64))]
    pub async fn fetch_with_cache_outcome<T, R, F, Fut, X>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
        transform: X,
    ) -> Cached<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R>>,
        X: FnOnce(Option<R>) -> T,
    {
        let now = self.clock.now_millis();
        let stored = match self.load_entry::<T>(key).await {
            Some(entry) if is_within_ttl(entry.timestamp, now, ttl) => {
                debug!(key, age_ms = now - entry.timestamp, "Cache hit");
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Cached {
                    origin: CacheOrigin::Hit {
                        stored_at: entry.timestamp,
                    },
                    value: entry.data,
                };
            }
            other => other,
        };

        debug!(key, "Cache miss or expired, fetching");

        match fetcher().await {
            Ok(raw) => {
                let data = transform(Some(raw));
                let fetched_at = self.clock.now_millis();
                if let Err(e) = self.store_entry(key, fetched_at, &data).await {
                    warn!(key, error = %e, "Failed to persist cache entry");
                }
                self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
                Cached {
                    value: data,
                    origin: CacheOrigin::Fresh { fetched_at },
                }
            }
            Err(e) => match stored {
                Some(entry) => {
                    warn!(key, error = %e, stored_at = entry.timestamp, "Fetch failed, serving stale cache");
                    self.counters.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
                    Cached {
                        value: entry.data,
                        origin: CacheOrigin::Stale {
                            stored_at: entry.timestamp,
                        },
                    }
                }
                None => {
                    warn!(key, error = %e, "Fetch failed with no cached copy, using default");
                    self.counters.defaults.fetch_add(1, Ordering::Relaxed);
                    Cached {
                        value: transform(None),
                        origin: CacheOrigin::Default,
                    }
                }
            },
        }
    }

    /// Reads the entry for `key` without TTL checks.
    ///
    /// Malformed entries are deleted and reported as `None`.
    pub async fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        self.load_entry(key).await
    }

    /// Deletes the entry for `key`.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.backend.remove(key).await
    }

    /// Deletes every listed key.
    pub async fn clear(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.backend.remove(key).await?;
        }
        Ok(())
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            refreshes: self.counters.refreshes.load(Ordering::Relaxed),
            stale_fallbacks: self.counters.stale_fallbacks.load(Ordering::Relaxed),
            defaults: self.counters.defaults.load(Ordering::Relaxed),
            malformed_evictions: self.counters.malformed_evictions.load(Ordering::Relaxed),
        }
    }

    async fn load_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.backend.read(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                let err = AccessError::MalformedCache {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "Deleting malformed cache entry");
                self.counters.malformed_evictions.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = self.backend.remove(key).await {
                    warn!(key, error = %e, "Failed to delete malformed cache entry");
                }
                None
            }
        }
    }

    async fn store_entry<T: Serialize>(&self, key: &str, timestamp: i64, data: &T) -> Result<()> {
        let encoded = serde_json::to_string(&CacheEntryRef { timestamp, data })?;
        self.backend.write(key, &encoded).await
    }
}

/// `age < ttl`. Entries stamped in the future count as age zero.
fn is_within_ttl(stored_at: i64, now: i64, ttl: Duration) -> bool {
    let age = now.saturating_sub(stored_at).max(0) as u128;
    age < ttl.as_millis()
}
