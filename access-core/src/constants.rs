//! Shared constants for the access map pipeline.
//!
//! Feed URLs here are only defaults; every one of them can be overridden
//! through configuration.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM FEEDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Published community spreadsheet (CSV export).
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRMzAQbd3MdmdliQnNSPgFvX2309klOt524-HuUoojAc2c2kLKwG9Ftr75YUhsXzMfJtpFerLGlmQOK/pub?gid=0&single=true&output=csv";

/// Published blocklist tab (CSV export, one name per line).
pub const DEFAULT_BLOCKLIST_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vS4KJi-cNJVKbT7cP8VFcDXPYld_R2-D5r3aNFdIARobTv-CzWqcdVl-LeDNJyhCPu6PWpYTho1O5Bg/pub?gid=1834778940&single=true&output=csv";

/// Refuge Restrooms location search endpoint.
pub const DEFAULT_API_URL: &str = "https://www.refugerestrooms.org/api/v1/restrooms/by_location.json";

/// Value a fresh deployment ships with before a blocklist sheet is configured.
/// Compared case-insensitively.
pub const BLOCKLIST_PLACEHOLDER: &str = "PASTE_YOUR_BLOCKLIST_GOOGLE_SHEET_CSV_URL_HERE";

/// Center of the covered area (Eugene, OR).
pub const DEFAULT_LATITUDE: f64 = 44.048;

/// Center of the covered area (Eugene, OR).
pub const DEFAULT_LONGITUDE: f64 = -123.090;

/// Page size requested from the location API.
pub const API_PER_PAGE: u32 = 50;

/// Per-request deadline in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Query parameter appended to bust intermediate caches.
pub const CACHE_BUST_PARAM: &str = "cb";

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE KEYS & TTLS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cache key for the normalized blocklist.
pub const BLOCKLIST_CACHE_KEY: &str = "blocklist";

/// Cache key for mapped API records.
pub const API_CACHE_KEY: &str = "refuge-api";

/// Cache key for the raw spreadsheet text (doubles as the offline copy).
pub const SHEET_CACHE_KEY: &str = "sheet-csv";

/// Subdirectory of the per-user cache directory used by default.
pub const CACHE_DIR_NAME: &str = "access-map";

/// Every key the pipeline writes.
pub const ALL_CACHE_KEYS: [&str; 3] = [BLOCKLIST_CACHE_KEY, API_CACHE_KEY, SHEET_CACHE_KEY];

/// API records are cached for a day.
pub const DEFAULT_API_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Blocklist shares the API's TTL unless configured otherwise.
pub const DEFAULT_BLOCKLIST_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Zero: the sheet is refetched on every load, the cached copy is only a fallback.
pub const DEFAULT_SHEET_TTL: Duration = Duration::ZERO;

// ═══════════════════════════════════════════════════════════════════════════════
// CSV LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Header marker column (identity).
pub const HEADER_LOCATION: &str = "Location";

/// Header marker column (second marker to tell headers from info rows).
pub const HEADER_PRIVACY: &str = "Privacy";

/// Marker of the embedded last-modified row, matched case-insensitively.
pub const LAST_MODIFIED_MARKER: &str = "last modified:";

// ═══════════════════════════════════════════════════════════════════════════════
// API MAPPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Tags given to every API record.
pub const API_TAGS: &str = "Restroom";

/// Suffix appended to API notes.
pub const API_NOTE_SUFFIX: &str = "(Source: Refuge Restrooms API)";

/// Access value when the API gives no directions.
pub const DEFAULT_ACCESS: &str = "Open";

// ═══════════════════════════════════════════════════════════════════════════════
// USER-FACING MESSAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Shown when the primary sheet cannot be loaded at all.
pub const SHEET_UNAVAILABLE_MESSAGE: &str =
    "Could not load community map data. Please check your connection.";

/// Shown when the supplementary API cannot be loaded.
pub const API_UNAVAILABLE_MESSAGE: &str = "Could not load additional locations.";
