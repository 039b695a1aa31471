//! Mock fetcher for testing.
//!
//! Provides canned bodies, failures and delays per URL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedBody, Fetcher};

#[derive(Clone)]
enum MockResponse {
    Body(FetchedBody),
    Status(u16),
    NetworkError(String),
}

/// Mock fetcher for testing.
///
/// Unknown URLs answer 404. Clones share state, so a test can keep a
/// handle for call assertions after moving a clone into the pipeline.
///
/// # Example
///
/// ```rust
/// use spec_compare::fetchers::MockFetcher;
///
/// let fetcher = MockFetcher::new()
///     .with_body("https://a.example/ds.pdf", b"%PDF-1.4 ...".to_vec())
///     .with_status("https://b.example/ds.pdf", 503);
/// ```
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    probes: Arc<RwLock<HashMap<String, u16>>>,
    fetch_calls: Arc<RwLock<Vec<String>>>,
    probe_calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(self, url: &str, response: MockResponse) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// Serve these bytes for the URL.
    pub fn with_body(self, url: &str, bytes: Vec<u8>) -> Self {
        self.insert(url, MockResponse::Body(FetchedBody::new(url, bytes)))
    }

    /// Serve an HTML page for the URL.
    pub fn with_html(self, url: &str, html: &str) -> Self {
        let body = FetchedBody::new(url, html.as_bytes().to_vec())
            .with_content_type("text/html; charset=utf-8");
        self.insert(url, MockResponse::Body(body))
    }

    /// Serve bytes as if the URL redirected to `final_url`.
    pub fn with_redirect(self, url: &str, final_url: &str, bytes: Vec<u8>) -> Self {
        self.insert(url, MockResponse::Body(FetchedBody::new(final_url, bytes)))
    }

    /// Answer the URL with a non-success status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.insert(url, MockResponse::Status(status))
    }

    /// Fail the URL with a network error.
    pub fn with_network_error(self, url: &str, message: &str) -> Self {
        self.insert(url, MockResponse::NetworkError(message.to_string()))
    }

    /// Delay every fetch and probe of the URL.
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(url.to_string(), delay);
        self
    }

    /// Status returned by `probe` for the URL.
    ///
    /// Without an explicit probe status, URLs with a canned body answer
    /// 200 and everything else 404.
    pub fn with_probe(self, url: &str, status: u16) -> Self {
        self.probes.write().unwrap().insert(url.to_string(), status);
        self
    }

    /// Number of fetch calls.
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.read().unwrap().len()
    }

    /// URLs fetched, in call order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.read().unwrap().clone()
    }

    /// URLs probed, in call order.
    pub fn probe_calls(&self) -> Vec<String> {
        self.probe_calls.read().unwrap().clone()
    }

    async fn delay_for(&self, url: &str) {
        let delay = self.delays.read().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedBody> {
        self.fetch_calls.write().unwrap().push(url.to_string());
        self.delay_for(url).await;

        let response = self.responses.read().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            Some(MockResponse::NetworkError(message)) => Err(FetchError::Network(message.into())),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }

    async fn probe(&self, url: &str) -> FetchResult<u16> {
        self.probe_calls.write().unwrap().push(url.to_string());
        self.delay_for(url).await;

        if let Some(status) = self.probes.read().unwrap().get(url) {
            return Ok(*status);
        }

        let response = self.responses.read().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(_)) => Ok(200),
            Some(MockResponse::Status(status)) => Ok(status),
            Some(MockResponse::NetworkError(message)) => Err(FetchError::Network(message.into())),
            None => Ok(404),
        }
    }
}
