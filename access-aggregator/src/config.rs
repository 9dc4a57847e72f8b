//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use access_cache::CacheStore;
use access_core::constants::{
    CACHE_DIR_NAME, DEFAULT_API_TTL, DEFAULT_API_URL, DEFAULT_BLOCKLIST_TTL, DEFAULT_BLOCKLIST_URL,
    DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_SHEET_TTL, DEFAULT_SHEET_URL,
    DEFAULT_TIMEOUT_SECONDS,
};
use access_core::error::{AccessError, Result};
use access_sources::{is_placeholder_url, HttpConfig};

/// Feed locations, cache policy, and the API search point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// CSV export of the community sheet
    pub sheet_url: String,
    /// CSV export of the blocklist; `None` disables blocking
    pub blocklist_url: Option<String>,
    /// Refuge Restrooms `by_location` endpoint
    pub api_url: String,
    /// API search latitude
    pub latitude: f64,
    /// API search longitude
    pub longitude: f64,
    /// Sheet cache TTL; 0 refetches on every load
    pub sheet_ttl_seconds: u64,
    /// Blocklist cache TTL
    pub blocklist_ttl_seconds: u64,
    /// API cache TTL
    pub api_ttl_seconds: u64,
    /// Per-request deadline
    pub timeout_seconds: u64,
    /// Directory for the persistent cache; in-memory when unset
    pub cache_dir: Option<PathBuf>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.into(),
            blocklist_url: Some(DEFAULT_BLOCKLIST_URL.into()),
            api_url: DEFAULT_API_URL.into(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            sheet_ttl_seconds: DEFAULT_SHEET_TTL.as_secs(),
            blocklist_ttl_seconds: DEFAULT_BLOCKLIST_TTL.as_secs(),
            api_ttl_seconds: DEFAULT_API_TTL.as_secs(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            cache_dir: default_cache_dir(),
        }
    }
}

/// `<user cache dir>/access-map`, when the platform has a cache directory.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(CACHE_DIR_NAME))
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AccessError::ConfigError(format!("{key}: invalid value '{raw}'"))),
        _ => Ok(default),
    }
}

impl AccessConfig {
    /// Loads `.env` (if present), then reads `ACCESS_*` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, e.g. a map in tests.
    ///
    /// Recognized keys: `ACCESS_SHEET_URL`, `ACCESS_BLOCKLIST_URL`, `ACCESS_API_URL`,
    /// `ACCESS_LAT`, `ACCESS_LNG`, `ACCESS_SHEET_TTL`, `ACCESS_BLOCKLIST_TTL`,
    /// `ACCESS_API_TTL`, `ACCESS_TIMEOUT`, `ACCESS_CACHE_DIR`. TTLs and the timeout are seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            sheet_url: non_empty("ACCESS_SHEET_URL").unwrap_or(defaults.sheet_url),
            blocklist_url: match lookup("ACCESS_BLOCKLIST_URL") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v),
                None => defaults.blocklist_url,
            },
            api_url: non_empty("ACCESS_API_URL").unwrap_or(defaults.api_url),
            latitude: parse_var("ACCESS_LAT", lookup("ACCESS_LAT"), defaults.latitude)?,
            longitude: parse_var("ACCESS_LNG", lookup("ACCESS_LNG"), defaults.longitude)?,
            sheet_ttl_seconds: parse_var(
                "ACCESS_SHEET_TTL",
                lookup("ACCESS_SHEET_TTL"),
                defaults.sheet_ttl_seconds,
            )?,
            blocklist_ttl_seconds: parse_var(
                "ACCESS_BLOCKLIST_TTL",
                lookup("ACCESS_BLOCKLIST_TTL"),
                defaults.blocklist_ttl_seconds,
            )?,
            api_ttl_seconds: parse_var(
                "ACCESS_API_TTL",
                lookup("ACCESS_API_TTL"),
                defaults.api_ttl_seconds,
            )?,
            timeout_seconds: parse_var(
                "ACCESS_TIMEOUT",
                lookup("ACCESS_TIMEOUT"),
                defaults.timeout_seconds,
            )?,
            cache_dir: if parse_var("ACCESS_NO_CACHE", lookup("ACCESS_NO_CACHE"), false)? {
                None
            } else {
                non_empty("ACCESS_CACHE_DIR")
                    .map(PathBuf::from)
                    .or(defaults.cache_dir)
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the feed URLs parse and the search point is a real coordinate.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("sheet_url", &self.sheet_url), ("api_url", &self.api_url)] {
            Url::parse(url).map_err(|e| AccessError::ConfigError(format!("{name}: {e}")))?;
        }
        if let Some(url) = self.blocklist_url.as_deref().filter(|u| !is_placeholder_url(u)) {
            Url::parse(url).map_err(|e| AccessError::ConfigError(format!("blocklist_url: {e}")))?;
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AccessError::ConfigError(format!(
                "search point ({}, {}) is out of range",
                self.latitude, self.longitude
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(AccessError::ConfigError("timeout must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Sets the sheet URL.
    pub fn with_sheet_url(mut self, url: impl Into<String>) -> Self {
        self.sheet_url = url.into();
        self
    }

    /// Sets or clears the blocklist URL.
    pub fn with_blocklist_url(mut self, url: Option<String>) -> Self {
        self.blocklist_url = url;
        self
    }

    /// Sets the API endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the API search point.
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Sets the sheet TTL.
    pub fn with_sheet_ttl(mut self, ttl: Duration) -> Self {
        self.sheet_ttl_seconds = ttl.as_secs();
        self
    }

    /// Sets the blocklist TTL.
    pub fn with_blocklist_ttl(mut self, ttl: Duration) -> Self {
        self.blocklist_ttl_seconds = ttl.as_secs();
        self
    }

    /// Sets the API TTL.
    pub fn with_api_ttl(mut self, ttl: Duration) -> Self {
        self.api_ttl_seconds = ttl.as_secs();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Persists the cache under `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Keeps the cache in memory for this process only.
    pub fn without_cache_dir(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    /// Sheet TTL as a duration.
    pub fn sheet_ttl(&self) -> Duration {
        Duration::from_secs(self.sheet_ttl_seconds)
    }

    /// Blocklist TTL as a duration.
    pub fn blocklist_ttl(&self) -> Duration {
        Duration::from_secs(self.blocklist_ttl_seconds)
    }

    /// API TTL as a duration.
    pub fn api_ttl(&self) -> Duration {
        Duration::from_secs(self.api_ttl_seconds)
    }

    /// HTTP settings derived from this config.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default().with_timeout(self.timeout_seconds)
    }

    /// The cache store this config asks for: on disk under `cache_dir`, else in memory.
    pub fn cache_store(&self) -> CacheStore {
        match &self.cache_dir {
            Some(dir) => CacheStore::on_disk(dir),
            None => CacheStore::in_memory(),
        }
    }
}
