//! # Access Map Cache
//!
//! TTL cache for upstream feeds, with stale-data fallback.
//!
//! [`CacheStore::fetch_with_cache`] is the pipeline's resilience layer: it serves
//! fresh entries without touching the network, refreshes expired ones, and when a
//! refresh fails returns whatever it last stored (or the transform's empty default).
//! Callers never see an error.
//!
//! Storage and time are pluggable:
//!
//! - [`MemoryBackend`] / [`FileBackend`] implement [`access_core::CacheBackend`]
//! - [`SystemClock`] / [`ManualClock`] implement [`access_core::Clock`]

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod backend;
mod clock;
mod store;

pub use backend::{FileBackend, MemoryBackend};
pub use clock::{ManualClock, SystemClock};
pub use store::{CacheEntry, CacheStats, CacheStore, Cached};
