//! # Access Map Core
//!
//! Core types, errors, and traits shared by every access map crate.
//!
//! - **Types**: [`LocationRecord`], [`FilterSet`], [`Blocklist`], [`AppState`] and the display set
//! - **Errors**: [`AccessError`] with the pipeline's failure taxonomy
//! - **Constants**: cache keys, feed defaults and API mapping values
//! - **Traits**: storage and clock seams used by the cache
//!
//! ## Example
//!
//! ```rust
//! use access_core::{FilterSet, LocationRecord};
//!
//! let record = LocationRecord::new("Cafe X").unwrap().with_tags("Food, WiFi");
//! let filters = FilterSet::all().toggle("food");
//! assert!(filters.matches(&record));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{AccessError, Result};
pub use traits::*;
pub use types::*;
