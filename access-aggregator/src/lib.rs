//! # Access Map Aggregator
//!
//! Turns whatever the sources produced into the list the map shows.
//!
//! - [`recompute`]: sheet-first merge, dedup by normalized name, filter visibility
//! - [`toggle_api_locations`] / [`toggle_filter`]: state actions that recompute
//! - [`DataService::load_all`]: blocklist first, then sheet and API concurrently
//! - [`AccessConfig`]: feed URLs, TTLs and cache location, from env or builders
//!
//! ## Example
//!
//! ```rust
//! use access_aggregator::recompute;
//! use access_core::{AppState, LocationRecord};
//!
//! let mut state = AppState::new();
//! state.sheet_locations = vec![LocationRecord::new("A").unwrap()];
//! state.api_locations = vec![LocationRecord::new("a").unwrap().from_api()];
//!
//! let display = recompute(&mut state);
//! assert_eq!(display.len(), 1);
//! assert!(!display.entries()[0].record.is_api_source);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod aggregate;
mod config;
mod service;

pub use aggregate::{dedup, recompute, set_filters, toggle_api_locations, toggle_filter};
pub use config::{default_cache_dir, AccessConfig};
pub use service::{sheet_status, DataService, LoadReport, SourceSummary};
