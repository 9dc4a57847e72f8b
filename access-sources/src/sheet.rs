//! Community spreadsheet adapter. This is the primary data source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use access_cache::CacheStore;
use access_core::constants::{DEFAULT_SHEET_TTL, SHEET_CACHE_KEY};
use access_core::{AccessError, Blocklist, CacheOrigin, LocationSource, SourceLoad};
use access_csv::{extract_last_modified, parse};

use crate::blocklist::apply_blocklist;
use crate::http::HttpClient;

/// Fetches the published sheet as CSV.
///
/// The raw text is what gets cached, so the stored copy doubles as the offline
/// fallback. With the default TTL of zero every load goes to the network.
pub struct SheetSource {
    url: String,
    ttl: Duration,
    http: Arc<HttpClient>,
    cache: Arc<CacheStore>,
}

impl SheetSource {
    /// Creates a source for the CSV export at `url`.
    pub fn new(url: impl Into<String>, http: Arc<HttpClient>, cache: Arc<CacheStore>) -> Self {
        Self {
            url: url.into(),
            ttl: DEFAULT_SHEET_TTL,
            http,
            cache,
        }
    }

    /// Overrides the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The feed URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LocationSource for SheetSource {
    fn name(&self) -> &'static str {
        "sheet"
    }

    #[instrument(skip(self, blocklist))]
    async fn load(&self, blocklist: &Blocklist) -> SourceLoad {
        let cached = self
            .cache
            .fetch_with_cache_outcome(
                SHEET_CACHE_KEY,
                self.ttl,
                || self.http.get_text(&self.url, true),
                |raw: Option<String>| raw.unwrap_or_default(),
            )
            .await;

        if cached.origin == CacheOrigin::Default {
            return SourceLoad::empty(CacheOrigin::Default);
        }

        let text = cached.value;
        let last_modified = extract_last_modified(&text);
        let (records, blocked) = apply_blocklist(self.name(), parse(&text), blocklist);

        if records.is_empty() {
            let err = AccessError::EmptyResult("sheet has no usable rows".into());
            warn!(error = %err, origin = ?cached.origin, "Sheet loaded without locations");
        }
        info!(
            records = records.len(),
            blocked,
            origin = ?cached.origin,
            last_modified = ?last_modified,
            "Sheet locations loaded"
        );

        SourceLoad {
            records,
            origin: cached.origin,
            blocked,
            last_modified,
        }
    }
}
