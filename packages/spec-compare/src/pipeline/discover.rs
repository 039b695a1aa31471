//! Candidate discovery - query to ranked candidate URLs.
//!
//! The searcher is asked for `oversample` times more hits than needed;
//! multi-product documents, marketplace listings and standards bodies are
//! filtered out before ranking.

use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use crate::error::{CompareError, Result};
use crate::traits::searcher::WebSearcher;
use crate::types::config::DiscoverConfig;
use crate::types::source::{CandidateSource, SourceKind};

/// URL fragments marking multi-product documents.
const MULTI_PRODUCT_MARKERS: &[&str] = &[
    "catalog",
    "catalogue",
    "manual",
    "guide",
    "brochure",
    "series-",
];

/// Host fragments of marketplaces and quote aggregators.
const GRAY_MARKET_HOSTS: &[&str] = &["alibaba", "aliexpress", "dhgate", "ebay", "rfq", "quote"];

/// Standards organizations, never suppliers.
const STANDARDS_HOSTS: &[&str] = &[
    "astm.org", "iso.org", "sae.org", "ansi.org", "asme.org", "nist.gov",
];

const PAGE_QUERY_SUFFIX: &str = "capabilities services manufacturing";

/// Turns a query into filtered, ranked candidates.
pub struct Discoverer<'a, S: WebSearcher> {
    searcher: &'a S,
    config: &'a DiscoverConfig,
}

impl<'a, S: WebSearcher> Discoverer<'a, S> {
    pub fn new(searcher: &'a S, config: &'a DiscoverConfig) -> Self {
        Self { searcher, config }
    }

    /// Search and filter, returning at most `limit` candidates.
    pub async fn discover(
        &self,
        query: &str,
        kind: SourceKind,
        supplier: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CandidateSource>> {
        if query.trim().is_empty() {
            return Err(CompareError::InvalidQuery {
                reason: "query is empty".into(),
            });
        }

        let search_query = build_search_query(query, kind, supplier);
        let wanted = limit.saturating_mul(self.config.oversample.max(1));
        let hits = self.searcher.search(&search_query, wanted).await?;
        let found = hits.len();

        let mut seen = HashSet::new();
        let mut candidates: Vec<CandidateSource> = hits
            .into_iter()
            .filter(|hit| seen.insert(hit.url.to_string()))
            .filter(|hit| {
                let keep = accepts(&hit.url, kind);
                if !keep {
                    debug!(url = %hit.url, kind = %kind, "Candidate filtered");
                }
                keep
            })
            .map(|hit| hit.into_candidate(kind))
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(limit);

        info!(
            query = %search_query,
            kind = %kind,
            found,
            kept = candidates.len(),
            "Discovery complete"
        );

        Ok(candidates)
    }
}

/// The search string sent to the searcher.
pub fn build_search_query(query: &str, kind: SourceKind, supplier: Option<&str>) -> String {
    let query = query.trim();
    match kind {
        SourceKind::Datasheet => format!("{} datasheet pdf", query),
        SourceKind::Page => match supplier.map(str::trim).filter(|s| !s.is_empty()) {
            Some(supplier) => format!("{} {} {}", supplier, query, PAGE_QUERY_SUFFIX),
            None => format!("{} {}", query, PAGE_QUERY_SUFFIX),
        },
    }
}

/// Whether a hit is a plausible candidate of the given kind.
pub fn accepts(url: &Url, kind: SourceKind) -> bool {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let full = url.as_str().to_lowercase();

    match kind {
        SourceKind::Datasheet => {
            !MULTI_PRODUCT_MARKERS.iter().any(|m| full.contains(m))
                && !GRAY_MARKET_HOSTS.iter().any(|h| host.contains(h))
        }
        SourceKind::Page => {
            !url.path().to_lowercase().ends_with(".pdf")
                && !STANDARDS_HOSTS
                    .iter()
                    .any(|s| host == *s || host.ends_with(&format!(".{}", s)))
        }
    }
}
