//! Page fetcher for product pages
//!
//! Issues one GET per URL with a fixed browser identity and an explicit
//! per-request timeout. Every failure is logged and reported as `None`; nothing
//! propagates past this boundary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::infrastructure::config::defaults;
use crate::infrastructure::parsing_error::{EngineError, EngineResult, FetchError};

/// Raw HTML of a successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub html: String,
}

/// `None` means the fetch failed
pub type FetchOutcome = Option<Document>;

/// Source of page content for the batch runner
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// HTTP client configuration for page fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub referrer: String,
    pub timeout_seconds: u64,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            referrer: defaults::REFERRER.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            follow_redirects: true,
        }
    }
}

/// reqwest-backed fetcher. No cookie store, so requests share no session.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl HttpPageFetcher {
    pub fn new(config: HttpClientConfig) -> EngineResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| EngineError::http_client(format!("invalid user agent: {e}")))?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referrer)
                .map_err(|e| EngineError::http_client(format!("invalid referrer: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| EngineError::http_client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!("🌐 HTTP GET: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Body { url: url.to_string(), source })?;

        if html.trim().is_empty() {
            return Err(FetchError::EmptyBody { url: url.to_string() });
        }

        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        match self.fetch_page(url).await {
            Ok(html) => {
                debug!("Fetched {} ({} bytes)", url, html.len());
                Some(Document {
                    url: url.to_string(),
                    html,
                })
            }
            Err(e) => {
                warn!(transient = e.is_transient(), "❌ Fetch failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_with_defaults() {
        let fetcher = HttpPageFetcher::new(HttpClientConfig::default());
        assert!(fetcher.is_ok());
        assert_eq!(fetcher.unwrap().config().referrer, "https://www.google.com");
    }

    #[test]
    fn rejects_header_breaking_user_agent() {
        let config = HttpClientConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpPageFetcher::new(config),
            Err(EngineError::HttpClient { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_absent_not_error() {
        let config = HttpClientConfig {
            timeout_seconds: 2,
            ..Default::default()
        };
        let fetcher = HttpPageFetcher::new(config).unwrap();
        // Port 9 on localhost is the discard service; nothing listens there in CI.
        assert!(fetcher.fetch("http://127.0.0.1:9/item").await.is_none());
        assert!(fetcher.fetch("not a url at all").await.is_none());
    }
}
