//! The sheet's embedded `Last Modified:` stamp.

use access_core::constants::LAST_MODIFIED_MARKER;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::tokenizer::tokenize;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y"];

/// Parses the date formats the sheet is known to use. Naive values are UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_matches('"').trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return Some(at.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Marker test with quotes ignored, so `"Last Modified":` matches too.
fn has_marker(text: &str) -> bool {
    text.replace('"', "").to_lowercase().contains(LAST_MODIFIED_MARKER)
}

/// Date candidates on a marker line, most likely first.
fn candidates(fields: &[String], marker_idx: usize) -> Vec<String> {
    let mut out = Vec::new();

    let marker = fields[marker_idx].replace('"', "");
    if let Some(pos) = marker.to_lowercase().find(LAST_MODIFIED_MARKER) {
        let inline = marker
            .get(pos + LAST_MODIFIED_MARKER.len()..)
            .unwrap_or("")
            .trim();
        if !inline.is_empty() {
            out.push(inline.to_string());
        }
    }

    let rest: Vec<&str> = fields[marker_idx + 1..]
        .iter()
        .map(String::as_str)
        .filter(|f| !f.is_empty())
        .collect();
    if let Some(first) = rest.first() {
        out.push((*first).to_string());
    }
    // An unquoted "Jan 5, 2024" splits across two fields
    if rest.len() >= 2 {
        out.push(format!("{}, {}", rest[0], rest[1]));
    }
    out
}

/// Finds the `Last Modified:` row anywhere in `text` and parses its date.
///
/// Returns `None` when there is no such row or its value does not parse.
pub fn extract_last_modified(text: &str) -> Option<DateTime<Utc>> {
    for line in text.lines() {
        if !has_marker(line) {
            continue;
        }

        let Some(fields) = tokenize(line).into_iter().next() else {
            continue;
        };
        let Some(marker_idx) = fields
            .iter()
            .position(|f| has_marker(f))
        else {
            continue;
        };

        let found = candidates(&fields, marker_idx)
            .iter()
            .find_map(|c| parse_timestamp(c));
        match found {
            Some(at) => return Some(at),
            None => debug!(line, "Last modified row has no parsable date"),
        }
    }
    None
}
