//! The common location schema every source normalizes into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

/// Lowercased, trimmed form of a location name.
///
/// This is the identity used for deduplication and blocklist lookups.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trims a value and maps empty strings to `None`.
fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// One normalized point of interest.
///
/// # Invariant
/// `location` is non-empty and trimmed. Constructors enforce it; identity
/// comparisons go through [`LocationRecord::normalized_name`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationRecord {
    /// Display name and identity key
    pub location: String,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// `"<lat>, <lng>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_long: Option<String>,
    /// "Public", "Exposed", "Private", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<String>,
    /// "All-Gender", "Gendered", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gendered: Option<String>,
    /// "Accessible", "Not Accessible", or free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Comma-separated tags ("Food, WiFi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// "Open" or a restriction description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    /// `;`-delimited entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    /// WiFi password, if shared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_code: Option<String>,
    /// Set only on records that came from the location API
    #[serde(default, rename = "isApiSource")]
    pub is_api_source: bool,
    /// Verification date (sheet records only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Sheet columns without a dedicated field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Marker category used for icons and coloring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    /// Tagged food
    Food,
    /// Tagged wifi
    Wifi,
    /// Public/exposed stalls or tagged restroom
    Restroom,
    /// Everything else
    Private,
}

/// How a restroom's privacy reads to a visitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StallKind {
    /// Public or exposed: several stalls
    MultiStall,
    /// Anything else: a single lockable room
    PrivateStall,
}

impl LocationRecord {
    /// Creates a record with only its identity set.
    ///
    /// Fails if the trimmed name is empty.
    pub fn new(location: impl Into<String>) -> Result<Self> {
        let location = non_empty(location)
            .ok_or_else(|| AccessError::InvalidRecord("location name is empty".into()))?;
        Ok(Self {
            location,
            address: None,
            lat_long: None,
            privacy: None,
            gendered: None,
            accessibility: None,
            notes: None,
            tags: None,
            access: None,
            hours: None,
            wifi_code: None,
            is_api_source: false,
            updated: None,
            extra: BTreeMap::new(),
        })
    }

    /// Identity key: lowercased, trimmed location.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.location)
    }

    /// True if both records name the same place.
    pub fn same_identity(&self, other: &LocationRecord) -> bool {
        self.normalized_name() == other.normalized_name()
    }

    /// Sets the address.
    pub fn with_address(mut self, value: impl Into<String>) -> Self {
        self.address = non_empty(value);
        self
    }

    /// Sets the `"<lat>, <lng>"` pair.
    pub fn with_lat_long(mut self, value: impl Into<String>) -> Self {
        self.lat_long = non_empty(value);
        self
    }

    /// Sets privacy.
    pub fn with_privacy(mut self, value: impl Into<String>) -> Self {
        self.privacy = non_empty(value);
        self
    }

    /// Sets the gendered description.
    pub fn with_gendered(mut self, value: impl Into<String>) -> Self {
        self.gendered = non_empty(value);
        self
    }

    /// Sets accessibility.
    pub fn with_accessibility(mut self, value: impl Into<String>) -> Self {
        self.accessibility = non_empty(value);
        self
    }

    /// Sets notes.
    pub fn with_notes(mut self, value: impl Into<String>) -> Self {
        self.notes = non_empty(value);
        self
    }

    /// Sets tags.
    pub fn with_tags(mut self, value: impl Into<String>) -> Self {
        self.tags = non_empty(value);
        self
    }

    /// Sets access.
    pub fn with_access(mut self, value: impl Into<String>) -> Self {
        self.access = non_empty(value);
        self
    }

    /// Sets hours.
    pub fn with_hours(mut self, value: impl Into<String>) -> Self {
        self.hours = non_empty(value);
        self
    }

    /// Sets the wifi code.
    pub fn with_wifi_code(mut self, value: impl Into<String>) -> Self {
        self.wifi_code = non_empty(value);
        self
    }

    /// Sets the verification date.
    pub fn with_updated(mut self, value: impl Into<String>) -> Self {
        self.updated = non_empty(value);
        self
    }

    /// Marks the record as API-originated.
    pub fn from_api(mut self) -> Self {
        self.is_api_source = true;
        self
    }

    /// Parsed `(lat, lng)`.
    ///
    /// `None` if missing, unparsable, non-finite, or either axis is exactly zero.
    /// Such records stay in the list but cannot be placed on a map.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let raw = self.lat_long.as_deref()?;
        let (lat, lng) = raw.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        if !lat.is_finite() || !lng.is_finite() || lat == 0.0 || lng == 0.0 {
            return None;
        }
        Some((lat, lng))
    }

    /// Individual opening-hours entries.
    pub fn hours_entries(&self) -> Vec<&str> {
        self.hours
            .as_deref()
            .map(|h| h.split(';').map(str::trim).filter(|e| !e.is_empty()).collect())
            .unwrap_or_default()
    }

    /// True when access is set and is something other than "open".
    pub fn has_restricted_access(&self) -> bool {
        self.access
            .as_deref()
            .map(|a| !a.trim().eq_ignore_ascii_case("open"))
            .unwrap_or(false)
    }

    /// True for "public" or "exposed" privacy.
    pub fn is_public(&self) -> bool {
        self.privacy
            .as_deref()
            .map(|p| {
                let p = p.trim();
                p.eq_ignore_ascii_case("public") || p.eq_ignore_ascii_case("exposed")
            })
            .unwrap_or(false)
    }

    /// Stall kind, when privacy is known.
    pub fn stall_kind(&self) -> Option<StallKind> {
        self.privacy.as_ref()?;
        Some(if self.is_public() {
            StallKind::MultiStall
        } else {
            StallKind::PrivateStall
        })
    }

    /// True if accessibility says accessible (and not "not accessible").
    pub fn is_accessible(&self) -> bool {
        self.accessibility
            .as_deref()
            .map(|a| {
                let a = a.to_lowercase();
                a.contains("accessible") && !a.contains("not accessible")
            })
            .unwrap_or(false)
    }

    /// Tags, lowercased (empty if none).
    pub fn tags_lower(&self) -> String {
        self.tags.as_deref().unwrap_or_default().to_lowercase()
    }

    /// Notes, lowercased (empty if none).
    pub fn notes_lower(&self) -> String {
        self.notes.as_deref().unwrap_or_default().to_lowercase()
    }

    /// Any hint that this place has a restroom.
    pub fn has_restroom_signal(&self) -> bool {
        if self.privacy.is_some() {
            return true;
        }
        let tags = self.tags_lower();
        let notes = self.notes_lower();
        tags.contains("restroom") || notes.contains("restroom") || notes.contains("bathroom")
    }

    /// Marker category: food, then wifi, then restroom, else private.
    pub fn category(&self) -> LocationCategory {
        let tags = self.tags_lower();
        if tags.contains("food") {
            LocationCategory::Food
        } else if tags.contains("wifi") {
            LocationCategory::Wifi
        } else if self.is_public() || tags.contains("restroom") {
            LocationCategory::Restroom
        } else {
            LocationCategory::Private
        }
    }
}
