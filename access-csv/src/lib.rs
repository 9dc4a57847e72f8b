//! # Access Map CSV
//!
//! Parser for the published community spreadsheet.
//!
//! The sheet is not a clean CSV file: a few info rows sit above the real header,
//! one of them usually carries a `Last Modified:` stamp, and data values may hold
//! quoted commas and newlines. This crate:
//!
//! - finds the header row (the first line naming both `Location` and `Privacy`)
//! - tokenizes the rest with an explicit state machine ([`TokenState`])
//! - maps rows onto [`LocationRecord`](access_core::LocationRecord)
//! - extracts the embedded last-modified timestamp
//!
//! ## Example
//!
//! ```rust
//! use access_csv::{extract_last_modified, parse};
//!
//! let text = "Info,,\nLast Modified:,2024-01-01\nLocation,Privacy\nCafe X,Public\n";
//! let records = parse(text);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].privacy.as_deref(), Some("Public"));
//! assert!(extract_last_modified(text).is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod parser;
mod timestamp;
mod tokenizer;

pub use parser::{parse, parse_table, write_csv, Column, CsvTable};
pub use timestamp::{extract_last_modified, parse_timestamp};
pub use tokenizer::{step, tokenize, Action, TokenState};
