//! # Access Map Sources
//!
//! Upstream adapters. Each one fetches through the shared
//! [`CacheStore`](access_cache::CacheStore), so a flaky network degrades to stale
//! or empty data instead of an error.
//!
//! - [`BlocklistSource`]: denylist of names; opt-in, skipped while unconfigured
//! - [`SheetSource`]: the community spreadsheet (primary data)
//! - [`RefugeSource`]: the Refuge Restrooms API (supplementary data)
//!
//! All three share one [`HttpClient`] with an explicit request deadline.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod blocklist;
mod http;
mod refuge;
mod sheet;

pub use blocklist::{is_placeholder_url, parse_blocklist, BlocklistSource};
pub use http::{HttpClient, HttpConfig};
pub use refuge::{RefugeRestroom, RefugeSource};
pub use sheet::SheetSource;
