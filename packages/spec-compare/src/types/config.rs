//! Configuration types for each pipeline stage.
//!
//! Every threshold lives here with its default; nothing downstream
//! hardcodes a number.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the whole comparison pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    pub discover: DiscoverConfig,
    pub acquire: AcquireConfig,
    pub normalize: NormalizeConfig,
    pub extract: ExtractConfig,
    pub keys: KeyNormalizerConfig,
    pub selector: SelectorConfig,
    pub contact: ContactConfig,
    pub debug: DebugConfig,

    /// Whole-request time budget in milliseconds. Default: 300 000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    300_000
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            discover: DiscoverConfig::default(),
            acquire: AcquireConfig::default(),
            normalize: NormalizeConfig::default(),
            extract: ExtractConfig::default(),
            keys: KeyNormalizerConfig::default(),
            selector: SelectorConfig::default(),
            contact: ContactConfig::default(),
            debug: DebugConfig::default(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl CompareConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Number of selected columns.
    pub fn with_column_count(mut self, count: usize) -> Self {
        self.selector.target_count = count;
        self
    }

    /// Minimum attributes every pair of compared sources must share.
    pub fn with_min_common(mut self, min_common: usize) -> Self {
        self.selector.min_common_attributes = min_common;
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug.enabled = enabled;
        self
    }

    pub fn with_contact_crawl(mut self, crawl: bool) -> Self {
        self.contact.crawl = crawl;
        self
    }
}

/// Candidate discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverConfig {
    /// Candidates requested from search per wanted source.
    ///
    /// Filtering drops aggregator and catalog URLs, so search is asked
    /// for more than the caller wants. Default: 3.
    pub oversample: usize,

    /// Default number of sources when the request does not say.
    /// Default: 5.
    pub default_count: usize,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            oversample: 3,
            default_count: 5,
        }
    }
}

/// Source acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Per-source time budget in milliseconds, covering link following.
    /// Default: 30 000.
    pub timeout_ms: u64,

    /// Datasheets smaller than this are treated as corrupted.
    /// Default: 1024 bytes.
    pub min_bytes: usize,

    /// Datasheets with more pages are rejected (catalogs, manuals).
    /// Default: 10.
    pub max_pages: usize,

    /// PDF links followed when a datasheet URL returns HTML.
    /// Default: 3.
    pub max_fallback_links: usize,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            min_bytes: 1024,
            max_pages: 10,
            max_fallback_links: 3,
        }
    }
}

impl AcquireConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Content normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Text beyond this many characters is dropped. Default: 20 000.
    pub max_chars: usize,

    /// Text shorter than this after truncation is a failure.
    /// Default: 100.
    pub min_chars: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_chars: 20_000,
            min_chars: 100,
        }
    }
}

/// How documents are sent to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// One call per document, bounded concurrency
    PerDocument,

    /// Several documents per call, split on failure
    #[default]
    Batched,
}

/// Attribute extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub mode: ExtractMode,

    /// Concurrent calls in per-document mode. Default: 5.
    pub concurrency: usize,

    /// Total characters of document text per batch. Default: 100 000.
    pub batch_char_budget: usize,

    /// Upper bound on characters per document inside a batch.
    /// Default: 8000.
    pub batch_doc_chars: usize,

    /// Rounds of halving a failed batch. Default: 1.
    pub max_split_depth: usize,

    /// Fewer successful extractions than this skips comparison.
    /// Default: 3.
    pub min_documents: usize,

    /// Output token limit per call. Default: 4096.
    pub max_tokens: u32,

    /// Optional product category to steer extraction.
    #[serde(default)]
    pub category_hint: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            mode: ExtractMode::default(),
            concurrency: 5,
            batch_char_budget: 100_000,
            batch_doc_chars: 8000,
            max_split_depth: 1,
            min_documents: 3,
            max_tokens: 4096,
            category_hint: None,
        }
    }
}

impl ExtractConfig {
    /// Characters allotted to each of `docs` documents in one batch.
    pub fn per_document_budget(&self, docs: usize) -> usize {
        if docs == 0 {
            return self.batch_doc_chars;
        }
        self.batch_doc_chars.min(self.batch_char_budget / docs)
    }
}

/// Canonical key grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyNormalizerConfig {
    /// Groups found in fewer sources are dropped. Default: 2.
    pub min_coverage: usize,

    /// Output token limit for the grouping call. Default: 4096.
    pub max_tokens: u32,
}

impl Default for KeyNormalizerConfig {
    fn default() -> Self {
        Self {
            min_coverage: 2,
            max_tokens: 4096,
        }
    }
}

/// Column selection and source pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Columns to select. Default: 5.
    pub target_count: usize,

    /// Absolute coverage floor. Default: 2.
    pub min_coverage: usize,

    /// Coverage floor as a fraction of compared sources. Default: 0.5.
    pub coverage_ratio: f64,

    /// Selected keys every pair of sources must share. Default: 3.
    pub min_common_attributes: usize,

    /// Pruning never goes below this many sources. Default: 2.
    pub min_sources: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            target_count: 5,
            min_coverage: 2,
            coverage_ratio: 0.5,
            min_common_attributes: 3,
            min_sources: 2,
        }
    }
}

impl SelectorConfig {
    /// Coverage a key needs to be selected over `sources` sources.
    pub fn coverage_floor(&self, sources: usize) -> usize {
        let relative = (sources as f64 * self.coverage_ratio).ceil() as usize;
        self.min_coverage.max(relative)
    }
}

/// Contact page resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Resolve contact URLs at all. Default: true.
    pub enabled: bool,

    /// Crawl the homepage and probe common paths; when false only the
    /// cheap `/contact` guess is used. Default: true.
    pub crawl: bool,

    /// Per-record time budget in milliseconds. Default: 8000.
    pub timeout_ms: u64,

    /// Link text or href fragments that mark a contact page.
    pub keywords: Vec<String>,

    /// Paths probed when the homepage has no contact link.
    pub probe_paths: Vec<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            crawl: true,
            timeout_ms: 8000,
            keywords: ["contact", "inquiry", "quote", "request", "get-quote", "reach-us"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            probe_paths: ["/contact", "/contact-us", "/inquiry", "/request-quote", "/get-quote"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ContactConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Debug artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Include stage timings and write intermediate markdown.
    pub enabled: bool,

    /// Where markdown is written. Default: none (timings only).
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompareConfig::new();
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.acquire.max_pages, 10);
        assert_eq!(config.normalize.max_chars, 20_000);
        assert_eq!(config.extract.min_documents, 3);
        assert_eq!(config.selector.target_count, 5);
        assert_eq!(config.contact.timeout(), Duration::from_secs(8));
    }

    #[test]
    fn test_coverage_floor() {
        let config = SelectorConfig::default();
        assert_eq!(config.coverage_floor(3), 2);
        assert_eq!(config.coverage_floor(5), 3);
        assert_eq!(config.coverage_floor(10), 5);
        assert_eq!(config.coverage_floor(1), 2);
    }

    #[test]
    fn test_per_document_budget() {
        let config = ExtractConfig::default();
        assert_eq!(config.per_document_budget(5), 8000);
        assert_eq!(config.per_document_budget(20), 5000);
        assert_eq!(config.per_document_budget(0), 8000);
    }

    #[test]
    fn test_builders() {
        let config = CompareConfig::new()
            .with_column_count(7)
            .with_min_common(4)
            .with_contact_crawl(false);

        assert_eq!(config.selector.target_count, 7);
        assert_eq!(config.selector.min_common_attributes, 4);
        assert!(!config.contact.crawl);
    }
}
