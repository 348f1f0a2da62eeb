//! HTTP fetch client for market-data endpoints.
//!
//! Transport caching is disabled per request (`Cache-Control:
//! no-cache`): every attempt hits the origin, never an intermediate
//! HTTP cache. Freshness is managed entirely by the orchestrator's own
//! layers. A non-2xx status is a hard failure for the attempt.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};

use marketdeck_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "marketdeck/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "marketdeck/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20_000),
        }
    }
}

/// Source of remote market-data snapshots.
///
/// The seam between the orchestrator and the network; tests substitute
/// their own implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a GET against `url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, Error>;
}

/// HTTP fetcher backed by reqwest.
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
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| Error::Http(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let data: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::ParseFailed(e.to_string()))?;

        tracing::debug!(
            url,
            fetch_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "fetched market data"
        );

        Ok(data)
    }
}
