//! Shared HTTP client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use access_core::constants::{CACHE_BUST_PARAM, DEFAULT_TIMEOUT_SECONDS};
use access_core::error::{AccessError, Result};

/// HTTP client configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: concat!("access-map/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// GET-only client for the upstream feeds.
///
/// Non-2xx answers become [`AccessError::HttpStatus`]; everything else that goes
/// wrong on the wire becomes [`AccessError::TransportFailure`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    http_client: reqwest::Client,
}

impl HttpClient {
    /// Creates a client with the given config.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AccessError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client })
    }

    /// Fetches `url` as text.
    ///
    /// With `bust_cache`, sends `Cache-Control: no-cache` and appends a
    /// `cb=<epoch-millis>` query parameter so no intermediate cache answers.
    #[instrument(skip(self))]
    pub async fn get_text(&self, url: &str, bust_cache: bool) -> Result<String> {
        let mut target = parse_url(url)?;
        let request = if bust_cache {
            let stamp = chrono::Utc::now().timestamp_millis().to_string();
            target
                .query_pairs_mut()
                .append_pair(CACHE_BUST_PARAM, &stamp);
            self.http_client
                .get(target.as_str())
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
        } else {
            self.http_client.get(target.as_str())
        };

        let response = request
            .send()
            .await
            .map_err(|e| AccessError::transport(url, e))?;
        let response = check_status(url, response)?;

        let text = response
            .text()
            .await
            .map_err(|e| AccessError::transport(url, e))?;
        debug!(bytes = text.len(), "Fetched text");
        Ok(text)
    }

    /// Fetches `url` with extra query parameters and decodes the JSON body.
    #[instrument(skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut target = parse_url(url)?;
        if !query.is_empty() {
            let mut pairs = target.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let response = self
            .http_client
            .get(target.as_str())
            .send()
            .await
            .map_err(|e| AccessError::transport(url, e))?;
        let response = check_status(url, response)?;

        let body = response
            .text()
            .await
            .map_err(|e| AccessError::transport(url, e))?;
        debug!(bytes = body.len(), "Fetched JSON");
        Ok(serde_json::from_str(&body)?)
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| AccessError::ConfigError(format!("Invalid URL '{url}': {e}")))
}

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AccessError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    struct HasQueryKey(&'static str);

    impl Match for HasQueryKey {
        fn matches(&self, request: &Request) -> bool {
            request.url.query_pairs().any(|(k, _)| k == self.0)
        }
    }

    fn client() -> HttpClient {
        HttpClient::new(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_get_text_busts_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sheet.csv"))
            .and(query_param("output", "csv"))
            .and(header("cache-control", "no-cache"))
            .and(HasQueryKey(CACHE_BUST_PARAM))
            .respond_with(ResponseTemplate::new(200).set_body_string("Location,Privacy\n"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/sheet.csv?output=csv", server.uri());
        let text = client().get_text(&url, true).await.unwrap();
        assert_eq!(text, "Location,Privacy\n");
    }

    #[tokio::test]
    async fn test_get_text_plain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Name\nA\n"))
            .mount(&server)
            .await;

        let text = client()
            .get_text(&format!("{}/list.csv", server.uri()), false)
            .await
            .unwrap();
        assert_eq!(text, "Name\nA\n");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client()
            .get_text(&format!("{}/down", server.uri()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::HttpStatus { status: 503, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_get_json_with_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("lat", "44.048"))
            .and(query_param("per_page", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1,2,3]"))
            .mount(&server)
            .await;

        let got: Vec<u32> = client()
            .get_json(
                &format!("{}/api", server.uri()),
                &[("lat", "44.048".to_string()), ("per_page", "50".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_json_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client()
            .get_json::<Vec<u32>>(&format!("{}/api", server.uri()), &[])
            .await
            .unwrap_err();
        assert!(err.is_data_error());
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = client()
            .get_text(&format!("http://127.0.0.1:{port}/feed.csv"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::TransportFailure { .. }));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(parse_url("not a url"), Err(AccessError::ConfigError(_))));
    }
}
