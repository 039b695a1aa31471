//! Source acquisition - download and validate each candidate.
//!
//! Every candidate is acquired concurrently under its own time budget;
//! one slow or broken source never affects another. Failures are
//! recorded on the returned [`AcquiredContent`], never raised.

use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::converters::{extract_links, ConverterSet};
use crate::error::AcquireError;
use crate::traits::fetcher::{FetchedBody, Fetcher};
use crate::types::config::AcquireConfig;
use crate::types::content::{AcquiredContent, DocumentFormat};
use crate::types::source::{CandidateSource, SourceKind};

/// Downloads candidates and validates them for their kind.
pub struct Acquirer<'a, F: Fetcher> {
    fetcher: &'a F,
    converters: &'a ConverterSet,
    config: &'a AcquireConfig,
}

impl<'a, F: Fetcher> Acquirer<'a, F> {
    pub fn new(fetcher: &'a F, converters: &'a ConverterSet, config: &'a AcquireConfig) -> Self {
        Self {
            fetcher,
            converters,
            config,
        }
    }

    /// Acquire every candidate concurrently. Output order matches input.
    pub async fn acquire_all(&self, sources: &[CandidateSource]) -> Vec<AcquiredContent> {
        let start = Instant::now();
        let results = join_all(sources.iter().map(|s| self.acquire_with_timeout(s))).await;

        let ok = results.iter().filter(|c| !c.is_failed()).count();
        info!(
            total = results.len(),
            ok,
            failed = results.len() - ok,
            duration_ms = start.elapsed().as_millis() as u64,
            "Acquisition complete"
        );

        results
    }

    /// Acquire one candidate under the per-source time budget.
    pub async fn acquire_with_timeout(&self, source: &CandidateSource) -> AcquiredContent {
        let start = Instant::now();
        match tokio::time::timeout(self.config.timeout(), self.acquire(source)).await {
            Ok(content) => content,
            Err(_) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                warn!(url = %source.url, elapsed_ms, "Acquisition timed out");
                AcquiredContent::failed(source.clone(), AcquireError::Timeout { elapsed_ms })
            }
        }
    }

    /// Acquire one candidate without a time limit.
    pub async fn acquire(&self, source: &CandidateSource) -> AcquiredContent {
        debug!(url = %source.url, kind = %source.kind, "Acquiring source");

        let body = match self.fetcher.fetch(&source.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %source.url, error = %e, "Download failed");
                return AcquiredContent::failed(source.clone(), e.into());
            }
        };

        let result = match source.kind {
            SourceKind::Datasheet => self.accept_datasheet(source, body).await,
            SourceKind::Page => self.accept_page(source, body),
        };

        match result {
            Ok(content) => content,
            Err(e) => {
                warn!(url = %source.url, error = %e, "Source rejected");
                AcquiredContent::failed(source.clone(), e)
            }
        }
    }

    async fn accept_datasheet(
        &self,
        source: &CandidateSource,
        body: FetchedBody,
    ) -> Result<AcquiredContent, AcquireError> {
        let pdf = if body.is_pdf() {
            self.check_size(&body)?;
            body
        } else if body.is_html() {
            self.follow_pdf_links(&body).await?
        } else {
            return Err(AcquireError::InvalidFormat(format!(
                "expected PDF, got {}",
                body.content_type.as_deref().unwrap_or("unknown content")
            )));
        };

        let pages = self
            .converters
            .pdf
            .page_count(&pdf.bytes)
            .await
            .map_err(|e| AcquireError::InvalidFormat(e.to_string()))?;

        if pages > self.config.max_pages {
            return Err(AcquireError::PageCountExceeded {
                pages,
                max: self.config.max_pages,
            });
        }

        Ok(AcquiredContent::downloaded(
            source.clone(),
            pdf.final_url,
            pdf.bytes,
            DocumentFormat::Pdf,
            Some(pages),
        ))
    }

    fn accept_page(
        &self,
        source: &CandidateSource,
        body: FetchedBody,
    ) -> Result<AcquiredContent, AcquireError> {
        if body.bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AcquireError::Corrupted {
                size: body.bytes.len(),
                min: 1,
            });
        }
        if body.is_pdf() {
            return Err(AcquireError::InvalidFormat(
                "expected HTML page, got PDF".into(),
            ));
        }
        if !body.is_html() {
            return Err(AcquireError::InvalidFormat(format!(
                "expected HTML page, got {}",
                body.content_type.as_deref().unwrap_or("unknown content")
            )));
        }

        Ok(AcquiredContent::downloaded(
            source.clone(),
            body.final_url,
            body.bytes,
            DocumentFormat::Html,
            None,
        ))
    }

    fn check_size(&self, body: &FetchedBody) -> Result<(), AcquireError> {
        if body.bytes.len() < self.config.min_bytes {
            return Err(AcquireError::Corrupted {
                size: body.bytes.len(),
                min: self.config.min_bytes,
            });
        }
        Ok(())
    }

    /// Follow PDF links from an HTML landing page; first valid PDF wins.
    async fn follow_pdf_links(&self, page: &FetchedBody) -> Result<FetchedBody, AcquireError> {
        let base = Url::parse(&page.final_url)
            .map_err(|e| AcquireError::InvalidFormat(format!("invalid page URL: {}", e)))?;
        let links = find_pdf_links(&page.text(), &base, self.config.max_fallback_links);

        if links.is_empty() {
            return Err(AcquireError::InvalidFormat(
                "HTML page without PDF links".into(),
            ));
        }

        for link in &links {
            debug!(page = %page.final_url, link = %link, "Following PDF link");
            match self.fetcher.fetch(link).await {
                Ok(body) if body.is_pdf() && body.bytes.len() >= self.config.min_bytes => {
                    return Ok(body);
                }
                Ok(body) => {
                    debug!(link = %link, bytes = body.bytes.len(), "Linked document is not a usable PDF");
                }
                Err(e) => {
                    debug!(link = %link, error = %e, "Linked document failed to download");
                }
            }
        }

        Err(AcquireError::InvalidFormat(format!(
            "no valid PDF among {} linked documents",
            links.len()
        )))
    }
}

/// Links on a page that point at PDFs, at most `max`.
pub fn find_pdf_links(html: &str, base: &Url, max: usize) -> Vec<String> {
    extract_links(html, base)
        .into_iter()
        .filter(|link| {
            let path = link.url.path().to_ascii_lowercase();
            let whole = link.url.as_str().to_ascii_lowercase();
            path.ends_with(".pdf") || whole.contains(".pdf?")
        })
        .map(|link| link.url.to_string())
        .take(max)
        .collect()
}
