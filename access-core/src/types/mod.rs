//! Domain types for the access map pipeline.
//!
//! - [`LocationRecord`]: the common schema every source normalizes into
//! - [`FilterSet`]: the legend selection and its visibility predicate
//! - [`Blocklist`]: normalized names that are never shown
//! - [`AppState`]: sheet/API records, display set, and status

mod blocklist;
mod filter;
mod location;
mod state;

pub use blocklist::*;
pub use filter::*;
pub use location::*;
pub use state::*;
