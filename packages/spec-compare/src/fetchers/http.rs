//! HTTP fetcher backed by `reqwest`.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedBody, Fetcher};

/// Browser-like user agent; many manufacturer sites refuse bot agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// HTTP fetcher that downloads bodies and probes URLs.
///
/// # Example
///
/// ```rust,ignore
/// use spec_compare::fetchers::{HttpFetcher, ValidatedFetcher};
///
/// let fetcher = ValidatedFetcher::new(HttpFetcher::new());
/// let body = fetcher.fetch("https://www.ti.com/lit/ds/symlink/lm7805.pdf").await?;
/// ```
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with a 30 second request timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn map_error(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_builder() {
            FetchError::InvalidUrl {
                url: url.to_string(),
            }
        } else {
            FetchError::Network(Box::new(err))
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedBody> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/pdf,text/html;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                Self::map_error(url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        debug!(url = %url, final_url = %final_url, bytes = bytes.len(), "HTTP fetch complete");

        Ok(FetchedBody {
            bytes: bytes.to_vec(),
            final_url,
            status: status.as_u16(),
            content_type,
        })
    }

    async fn probe(&self, url: &str) -> FetchResult<u16> {
        let response = self
            .client
            .head(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        let status = response.status().as_u16();

        // Some servers reject HEAD outright
        if status == 405 || status == 501 {
            let response = self
                .client
                .get(url)
                .header("User-Agent", &self.user_agent)
                .send()
                .await
                .map_err(|e| Self::map_error(url, e))?;
            return Ok(response.status().as_u16());
        }

        Ok(status)
    }
}
