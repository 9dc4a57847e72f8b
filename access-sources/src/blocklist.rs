//! Opt-in denylist of location names.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use access_cache::CacheStore;
use access_core::constants::{BLOCKLIST_CACHE_KEY, BLOCKLIST_PLACEHOLDER, DEFAULT_BLOCKLIST_TTL};
use access_core::{Blocklist, BlocklistProvider, LocationRecord};
use access_csv::tokenize;

use crate::http::HttpClient;

/// True for an unset URL or the shipped placeholder (any case).
pub fn is_placeholder_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.to_uppercase().contains(BLOCKLIST_PLACEHOLDER)
}

/// Parses the blocklist feed: header row dropped, one optionally quoted name per line.
///
/// Each line goes through the sheet tokenizer so `""` escapes unquote the same
/// way on both sides.
pub fn parse_blocklist(text: &str) -> Blocklist {
    Blocklist::from_names(text.lines().skip(1).filter_map(|line| {
        tokenize(line)
            .into_iter()
            .next()
            .and_then(|fields| fields.into_iter().next())
    }))
}

/// Drops blocked records and logs each one.
pub(crate) fn apply_blocklist(
    source: &str,
    records: Vec<LocationRecord>,
    blocklist: &Blocklist,
) -> (Vec<LocationRecord>, usize) {
    let (kept, blocked) = blocklist.partition(records);
    for record in &blocked {
        debug!(source, location = %record.location, "Blocked location");
    }
    (kept, blocked.len())
}

/// Fetches and caches the blocklist feed.
pub struct BlocklistSource {
    url: Option<String>,
    ttl: Duration,
    http: Arc<HttpClient>,
    cache: Arc<CacheStore>,
}

impl BlocklistSource {
    /// Creates a source. `None` or the placeholder URL disables blocking.
    pub fn new(url: Option<String>, http: Arc<HttpClient>, cache: Arc<CacheStore>) -> Self {
        Self {
            url,
            ttl: DEFAULT_BLOCKLIST_TTL,
            http,
            cache,
        }
    }

    /// Overrides the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The feed URL, unless blocking is disabled.
    pub fn configured_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !is_placeholder_url(url))
    }
}

#[async_trait]
impl BlocklistProvider for BlocklistSource {
    #[instrument(skip(self))]
    async fn load(&self) -> Blocklist {
        let Some(url) = self.configured_url() else {
            debug!("Blocklist not configured, skipping");
            return Blocklist::new();
        };

        let blocklist = self
            .cache
            .fetch_with_cache(
                BLOCKLIST_CACHE_KEY,
                self.ttl,
                || self.http.get_text(url, false),
                |raw: Option<String>| raw.map(|text| parse_blocklist(&text)).unwrap_or_default(),
            )
            .await;

        info!(names = blocklist.len(), "Blocklist loaded");
        blocklist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(url: Option<String>, cache: Arc<CacheStore>) -> BlocklistSource {
        let http = Arc::new(HttpClient::new(&Default::default()).unwrap());
        BlocklistSource::new(url, http, cache)
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder_url(""));
        assert!(is_placeholder_url("   "));
        assert!(is_placeholder_url(BLOCKLIST_PLACEHOLDER));
        assert!(is_placeholder_url(&BLOCKLIST_PLACEHOLDER.to_lowercase()));
        assert!(!is_placeholder_url("https://docs.google.com/x/pub?output=csv"));
    }

    #[test]
    fn test_parse_blocklist() {
        let list = parse_blocklist("Name\nCafe X\n\"  Bad Spot \"\n\n  \nLIBRARY\r\n");
        let names: Vec<_> = list.iter().collect();
        assert_eq!(names, vec!["bad spot", "cafe x", "library"]);
    }

    #[test]
    fn test_escaped_quotes_match_sheet_records() {
        let list = parse_blocklist("Name\n\"The \"\"Spot\"\"\"\n\"Joe's, Diner\"\n");
        let sheet = access_csv::parse(
            "Location,Privacy\n\"The \"\"Spot\"\"\",Public\n\"Joe's, Diner\",Private\nPark,Public\n",
        );
        assert_eq!(sheet[0].location, "The \"Spot\"");

        let (kept, blocked) = apply_blocklist("test", sheet, &list);
        assert_eq!(blocked, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].location, "Park");
    }

    #[test]
    fn test_parse_blocklist_header_only() {
        assert!(parse_blocklist("Name\n").is_empty());
        assert!(parse_blocklist("").is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_makes_no_request() {
        let cache = Arc::new(CacheStore::in_memory());
        for url in [None, Some(BLOCKLIST_PLACEHOLDER.to_string())] {
            let list = source(url, cache.clone()).load().await;
            assert!(list.is_empty());
        }
        assert_eq!(cache.stats(), Default::default());
    }

    #[tokio::test]
    async fn test_load_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blocklist.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Name\nCafe X\n"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(CacheStore::in_memory());
        let src = source(Some(format!("{}/blocklist.csv", server.uri())), cache.clone());

        let first = src.load().await;
        let second = src.load().await;
        assert!(first.contains("cafe x"));
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = Arc::new(CacheStore::in_memory());
        let list = source(Some(format!("{}/blocklist.csv", server.uri())), cache.clone())
            .load()
            .await;
        assert!(list.is_empty());
        assert_eq!(cache.stats().defaults, 1);
    }

    #[test]
    fn test_apply_blocklist() {
        let list = Blocklist::from_names(["cafe x"]);
        let records = vec![
            LocationRecord::new("Cafe X").unwrap(),
            LocationRecord::new("Park").unwrap(),
        ];
        let (kept, blocked) = apply_blocklist("test", records, &list);
        assert_eq!(blocked, 1);
        assert_eq!(kept[0].location, "Park");
    }
}
