//! Common traits for the access map pipeline.
//!
//! These are the seams between the pipeline stages: where cached bytes live,
//! what time it is, and what a location source looks like to the aggregator.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Blocklist, SourceLoad};

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw key/value storage underneath the cache store.
///
/// Values are opaque serialized entries; decoding and TTL checks happen in the
/// cache store. Implementations might use:
/// - In-memory maps (tests, single-run CLI)
/// - One file per key on disk (offline fallback across runs)
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Reads the stored value for `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the stored value for `key`.
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes the stored value for `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Wall-clock source, in Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Anything that produces the denylist of normalized names.
#[async_trait]
pub trait BlocklistProvider: Send + Sync {
    /// Loads the blocklist. Never fails; an unreachable feed yields stale or empty data.
    async fn load(&self) -> Blocklist;
}

/// Anything that produces normalized location records.
///
/// Loads never fail outright: the outcome's origin says whether the records are
/// fresh, stale, or the empty default.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Loads records with blocked names removed.
    async fn load(&self, blocklist: &Blocklist) -> SourceLoad;
}
