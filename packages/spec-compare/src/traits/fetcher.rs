//! Fetcher trait for byte-level HTTP access.
//!
//! Acquisition and contact resolution only need "give me the bytes at
//! this URL" and "does this URL answer 200". Keeping that behind a trait
//! lets the whole pipeline run against [`crate::fetchers::MockFetcher`].

use async_trait::async_trait;

use crate::error::FetchResult;

/// A downloaded response body.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Raw body bytes
    pub bytes: Vec<u8>,

    /// URL after redirects
    pub final_url: String,

    /// HTTP status (always a success status)
    pub status: u16,

    /// `Content-Type` header, if present
    pub content_type: Option<String>,
}

impl FetchedBody {
    pub fn new(final_url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            final_url: final_url.into(),
            status: 200,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Body starts with the PDF magic bytes.
    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }

    /// Body looks like an HTML document, by header or by sniffing.
    pub fn is_html(&self) -> bool {
        if let Some(ct) = &self.content_type {
            if ct.to_ascii_lowercase().contains("text/html") {
                return true;
            }
        }

        let head = &self.bytes[..self.bytes.len().min(512)];
        let head = String::from_utf8_lossy(head).to_ascii_lowercase();
        let head = head.trim_start();
        head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<head")
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Fetcher trait for downloading documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET the URL, following redirects. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedBody>;

    /// Cheap existence check; returns the final HTTP status.
    async fn probe(&self, url: &str) -> FetchResult<u16>;
}
