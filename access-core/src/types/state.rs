//! Load outcomes, status, and the application state the aggregator publishes into.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{FilterSet, LocationRecord};

// ═══════════════════════════════════════════════════════════════════════════════
// LOAD OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a cached value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheOrigin {
    /// Fetched just now and persisted.
    Fresh {
        /// Fetch time, epoch millis
        fetched_at: i64,
    },
    /// Served from an entry still within its TTL.
    Hit {
        /// Entry timestamp, epoch millis
        stored_at: i64,
    },
    /// Fetch failed; served from an expired entry.
    Stale {
        /// Entry timestamp, epoch millis
        stored_at: i64,
    },
    /// Fetch failed with nothing stored; the transform's empty default.
    Default,
}

impl CacheOrigin {
    /// True if the value reflects the upstream as of its TTL window.
    pub fn is_current(&self) -> bool {
        matches!(self, CacheOrigin::Fresh { .. } | CacheOrigin::Hit { .. })
    }

    /// True if the value is a fallback after a failed fetch.
    pub fn is_stale(&self) -> bool {
        matches!(self, CacheOrigin::Stale { .. })
    }

    /// True if no real data was available at all.
    pub fn is_default(&self) -> bool {
        matches!(self, CacheOrigin::Default)
    }

    /// Timestamp (epoch millis) of the data, when there is one.
    pub fn timestamp_millis(&self) -> Option<i64> {
        match self {
            CacheOrigin::Fresh { fetched_at } => Some(*fetched_at),
            CacheOrigin::Hit { stored_at } | CacheOrigin::Stale { stored_at } => Some(*stored_at),
            CacheOrigin::Default => None,
        }
    }
}

/// Result of loading one location source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceLoad {
    /// Records with blocked names removed
    pub records: Vec<LocationRecord>,
    /// Freshness of the records
    pub origin: CacheOrigin,
    /// Number of records the blocklist removed
    pub blocked: usize,
    /// Feed-level last modified timestamp, if the source embeds one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceLoad {
    /// An empty load with the given origin.
    pub fn empty(origin: CacheOrigin) -> Self {
        Self {
            records: Vec::new(),
            origin,
            blocked: 0,
            last_modified: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATUS & NOTIFICATIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn format_stamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %-I:%M %p").to_string()
}

/// Millisecond timestamp to `DateTime<Utc>`; out-of-range values clamp to the epoch.
pub fn datetime_from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

/// Status of the primary (sheet) data, as shown in the "last updated" badge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetStatus {
    /// Nothing loaded yet.
    #[default]
    NotLoaded,
    /// Current data. `updated` is the sheet's own last-modified stamp, or the
    /// fetch time when the sheet carries none.
    Fresh {
        /// Last-modified or fetch time
        updated: DateTime<Utc>,
    },
    /// Network failed; showing the offline copy.
    Offline {
        /// The offline copy's own last-modified stamp
        last_modified: Option<DateTime<Utc>>,
    },
    /// Network failed and no offline copy exists.
    Unavailable,
}

impl SheetStatus {
    /// True when the user must be told the map is empty for a reason.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SheetStatus::Unavailable)
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStatus::NotLoaded => f.write_str("Loading..."),
            SheetStatus::Fresh { updated } => write!(f, "Updated: {}", format_stamp(updated)),
            SheetStatus::Offline { last_modified: Some(at) } => {
                write!(f, "Offline (Updated: {})", format_stamp(at))
            }
            SheetStatus::Offline { last_modified: None } => f.write_str("Using Offline Data"),
            SheetStatus::Unavailable => f.write_str("Could not load map data."),
        }
    }
}

/// Severity of a user notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Something failed
    Error,
}

/// A transient message for the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text to show
    pub message: String,
}

impl Notification {
    /// An error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPLAY SET
// ═══════════════════════════════════════════════════════════════════════════════

/// A deduplicated record plus its visibility under the active filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayEntry {
    /// The record
    pub record: LocationRecord,
    /// Whether the active filters let it through
    pub visible: bool,
}

/// Canonical, ordered, deduplicated list handed to the rendering layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplaySet {
    entries: Vec<DisplayEntry>,
}

impl DisplaySet {
    /// Wraps already-deduplicated entries.
    pub fn new(entries: Vec<DisplayEntry>) -> Self {
        Self { entries }
    }

    /// All entries, visible or not.
    pub fn entries(&self) -> &[DisplayEntry] {
        &self.entries
    }

    /// All records in display order.
    pub fn records(&self) -> impl Iterator<Item = &LocationRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Records the filters let through.
    pub fn visible(&self) -> impl Iterator<Item = &LocationRecord> {
        self.entries.iter().filter(|e| e.visible).map(|e| &e.record)
    }

    /// Number of visible records.
    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|e| e.visible).count()
    }

    /// Records that can be placed on a map.
    pub fn mappable(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records().filter(|r| r.coordinates().is_some())
    }

    /// Finds an entry by (normalized) name.
    pub fn get(&self, name: &str) -> Option<&DisplayEntry> {
        let wanted = super::normalize_name(name);
        self.entries.iter().find(|e| e.record.normalized_name() == wanted)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// The slice of application state the pipeline reads and writes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    /// Records from the community sheet
    pub sheet_locations: Vec<LocationRecord>,
    /// Records from the location API
    pub api_locations: Vec<LocationRecord>,
    /// Whether API records join the display set
    pub show_api_locations: bool,
    /// Legend selection
    pub active_filters: FilterSet,
    /// Last published display set
    pub display: DisplaySet,
    /// Sheet freshness badge
    pub status: SheetStatus,
    /// Messages raised by the last load
    pub notifications: Vec<Notification>,
}

impl AppState {
    /// Fresh state: nothing loaded, API records shown, `{all}` filters.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sheet_locations: Vec::new(),
            api_locations: Vec::new(),
            show_api_locations: true,
            active_filters: FilterSet::all(),
            display: DisplaySet::default(),
            status: SheetStatus::NotLoaded,
            notifications: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(SheetStatus::Fresh { updated: at }.to_string(), "Updated: Jan 1, 12:00 AM");

        let at = Utc.with_ymd_and_hms(2024, 10, 15, 14, 5, 0).unwrap();
        assert_eq!(
            SheetStatus::Offline { last_modified: Some(at) }.to_string(),
            "Offline (Updated: Oct 15, 2:05 PM)"
        );
        assert_eq!(SheetStatus::Offline { last_modified: None }.to_string(), "Using Offline Data");
        assert_eq!(SheetStatus::Unavailable.to_string(), "Could not load map data.");
    }

    #[test]
    fn test_origin_classification() {
        assert!(CacheOrigin::Fresh { fetched_at: 1 }.is_current());
        assert!(CacheOrigin::Hit { stored_at: 1 }.is_current());
        assert!(CacheOrigin::Stale { stored_at: 1 }.is_stale());
        assert!(CacheOrigin::Default.is_default());
        assert_eq!(CacheOrigin::Default.timestamp_millis(), None);
        assert_eq!(CacheOrigin::Stale { stored_at: 7 }.timestamp_millis(), Some(7));
    }

    #[test]
    fn test_datetime_from_millis() {
        let at = datetime_from_millis(1_704_067_200_000);
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_notification_json() {
        let note = Notification::error("Could not load additional locations.");
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            serde_json::json!({ "level": "error", "message": "Could not load additional locations." })
        );
    }

    #[test]
    fn test_app_state_defaults() {
        let state = AppState::new();
        assert_eq!(SheetStatus::default(), SheetStatus::NotLoaded);
        assert!(state.show_api_locations);
        assert!(state.active_filters.is_all());
        assert_eq!(state.status, SheetStatus::NotLoaded);
        assert!(state.display.is_empty());
    }

    #[test]
    fn test_display_set_views() {
        let a = LocationRecord::new("A").unwrap().with_lat_long("44.0, -123.0");
        let b = LocationRecord::new("B").unwrap();
        let set = DisplaySet::new(vec![
            DisplayEntry { record: a, visible: true },
            DisplayEntry { record: b, visible: false },
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.visible_count(), 1);
        assert_eq!(set.mappable().count(), 1);
        assert!(set.get(" a ").is_some());
        assert!(!set.get("b").unwrap().visible);
    }
}
