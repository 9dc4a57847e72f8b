//! Refuge Restrooms API adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use access_cache::CacheStore;
use access_core::constants::{
    API_CACHE_KEY, API_NOTE_SUFFIX, API_PER_PAGE, API_TAGS, DEFAULT_ACCESS, DEFAULT_API_TTL,
};
use access_core::error::Result;
use access_core::{Blocklist, LocationRecord, LocationSource, SourceLoad};

use crate::blocklist::apply_blocklist;
use crate::http::HttpClient;

/// One item of the `by_location` response. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefugeRestroom {
    /// Place name
    pub name: String,
    /// Street address
    pub street: Option<String>,
    /// City
    pub city: Option<String>,
    /// Latitude
    pub latitude: Option<f64>,
    /// Longitude
    pub longitude: Option<f64>,
    /// Single-occupancy, any gender
    pub unisex: bool,
    /// Wheelchair accessible
    pub accessible: bool,
    /// Free-text comment
    pub comment: Option<String>,
    /// How to find it
    pub directions: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RefugeRestroom {
    /// Maps the item onto the common schema. Fails on a blank name.
    pub fn into_record(self) -> Result<LocationRecord> {
        let address = [present(&self.street), present(&self.city)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");

        let lat_long = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => format!("{lat}, {lng}"),
            _ => String::new(),
        };

        let (privacy, gendered) = if self.unisex {
            ("Private", "All-Gender")
        } else {
            ("Public", "Gendered")
        };

        let accessibility = if self.accessible { "Accessible" } else { "Not Accessible" };

        let notes = match present(&self.comment) {
            Some(comment) => format!("{comment} {API_NOTE_SUFFIX}"),
            None => API_NOTE_SUFFIX.to_string(),
        };

        let access = present(&self.directions).unwrap_or(DEFAULT_ACCESS).to_string();

        Ok(LocationRecord::new(self.name)?
            .with_address(address)
            .with_lat_long(lat_long)
            .with_privacy(privacy)
            .with_gendered(gendered)
            .with_accessibility(accessibility)
            .with_notes(notes)
            .with_tags(API_TAGS)
            .with_access(access)
            .from_api())
    }
}

/// Maps a response, dropping items without a name.
fn map_restrooms(items: Vec<RefugeRestroom>) -> Vec<LocationRecord> {
    items
        .into_iter()
        .filter_map(|item| match item.into_record() {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Skipping API item");
                None
            }
        })
        .collect()
}

/// Supplementary restroom locations near a fixed point.
pub struct RefugeSource {
    endpoint: String,
    latitude: f64,
    longitude: f64,
    per_page: u32,
    ttl: Duration,
    http: Arc<HttpClient>,
    cache: Arc<CacheStore>,
}

impl RefugeSource {
    /// Creates a source querying `endpoint` around `(latitude, longitude)`.
    pub fn new(
        endpoint: impl Into<String>,
        latitude: f64,
        longitude: f64,
        http: Arc<HttpClient>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            latitude,
            longitude,
            per_page: API_PER_PAGE,
            ttl: DEFAULT_API_TTL,
            http,
            cache,
        }
    }

    /// Overrides the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Overrides the page size.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    fn query(&self) -> [(&'static str, String); 3] {
        [
            ("lat", self.latitude.to_string()),
            ("lng", self.longitude.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}

#[async_trait]
impl LocationSource for RefugeSource {
    fn name(&self) -> &'static str {
        "refuge-api"
    }

    #[instrument(skip(self, blocklist))]
    async fn load(&self, blocklist: &Blocklist) -> SourceLoad {
        let query = self.query();
        let cached = self
            .cache
            .fetch_with_cache_outcome(
                API_CACHE_KEY,
                self.ttl,
                || self.http.get_json::<Vec<RefugeRestroom>>(&self.endpoint, &query),
                |raw: Option<Vec<RefugeRestroom>>| raw.map(map_restrooms).unwrap_or_default(),
            )
            .await;

        let (records, blocked) = apply_blocklist(self.name(), cached.value, blocklist);
        if records.is_empty() && cached.origin.is_current() {
            info!("API returned no usable locations");
        }
        info!(records = records.len(), blocked, origin = ?cached.origin, "API locations loaded");

        SourceLoad {
            records,
            origin: cached.origin,
            blocked,
            last_modified: None,
        }
    }
}
