//! HTTP fetch pipeline for build assets.
//!
//! ### Cache bypass
//! - Install-time staging fetches send `Cache-Control: no-cache` and
//!   `Pragma: no-cache` so intermediaries revalidate instead of replaying
//!   a stale copy.
//!
//! ### Policy neutrality
//! - HTTP error statuses are returned, not raised: the interception
//!   policies decide what a non-success response means. Only network-level
//!   failures and oversized bodies are errors at this layer.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};

use appshell_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "appshell-worker/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "appshell-worker/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    /// The URL requested
    pub url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
}

impl FetchedAsset {
    /// Whether the response status indicates success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Seam between cache policy and the network.
///
/// The worker's lifecycle and interception logic are written against this
/// trait so they can be exercised without a network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// With `bypass_http_cache` set, intermediaries are told to revalidate
    /// rather than serve a stored copy.
    async fn fetch(&self, url: &Url, bypass_http_cache: bool) -> Result<FetchedAsset, Error>;
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, url: &Url, bypass_http_cache: bool) -> Result<FetchedAsset, Error> {
        let start = Instant::now();

        let mut request = self.http.get(url.clone());
        if bypass_http_cache {
            request = request
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::NetworkFetch(format!("{url}: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFetch(format!("failed to read response from {url}: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(FetchedAsset { url: url.clone(), status, content_type, headers, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "appshell-worker/0.1");
        assert_eq!(config.max_bytes, 50 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetched_asset_success() {
        let asset = FetchedAsset {
            url: Url::parse("https://app.example.com/main.js").unwrap(),
            status: StatusCode::OK,
            content_type: Some("text/javascript".to_string()),
            headers: header::HeaderMap::new(),
            bytes: Bytes::new(),
        };
        assert!(asset.is_success());

        let failed = FetchedAsset { status: StatusCode::NOT_FOUND, ..asset };
        assert!(!failed.is_success());
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let config = FetchConfig::default();
        let client = FetchClient::new(config);
        assert!(client.is_ok());
    }
}
