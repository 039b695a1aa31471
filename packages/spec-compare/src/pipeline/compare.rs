//! The Comparator - main entry point for the comparison library.
//!
//! Runs the stages in order:
//!
//! 1. Discovery (skipped by [`Comparator::compare_sources`])
//! 2. Acquisition, all candidates in parallel
//! 3. Normalization to bounded markdown
//! 4. Attribute extraction
//! 5. Key normalization
//! 6. Coverage selection and pruning
//! 7. Assembly and contact resolution
//!
//! Sources lost along the way are reported on the response; only a
//! request with no usable source at all is an error.

use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::converters::ConverterSet;
use crate::error::{CompareError, Result};
use crate::pipeline::acquire::Acquirer;
use crate::pipeline::assemble::{assemble_records, build_columns, raw_record};
use crate::pipeline::contact::ContactResolver;
use crate::pipeline::discover::Discoverer;
use crate::pipeline::extract::{AttributeExtractor, ExtractionInput};
use crate::pipeline::keys::KeyNormalizer;
use crate::pipeline::normalize::ContentNormalizer;
use crate::pipeline::select::CoverageSelector;
use crate::traits::{ai::AI, fetcher::Fetcher, searcher::WebSearcher};
use crate::types::{
    attributes::RawAttributeSet,
    config::CompareConfig,
    content::AcquiredContent,
    record::{
        ComparableRecord, ComparisonResponse, ComparisonStatus, SourceFailure, StageTimings,
    },
    source::{CandidateSource, SourceKind},
};

/// A comparison request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRequest {
    /// Product or service query, e.g. "LM7805 voltage regulator"
    pub query: String,

    /// Kind of sources to compare
    pub kind: SourceKind,

    /// Candidates to discover; defaults to the discovery config
    pub count: Option<usize>,

    /// Supplier to focus page discovery on
    pub supplier_name: Option<String>,

    /// Product category passed to extraction
    pub category_hint: Option<String>,
}

impl CompareRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: SourceKind::Datasheet,
            count: None,
            supplier_name: None,
            category_hint: None,
        }
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier_name = Some(supplier.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_hint = Some(category.into());
        self
    }
}

/// The main entry point - compares sources for a query.
///
/// Capabilities are passed in once and reused for every request; the
/// comparator keeps no state between requests.
///
/// # Example
///
/// ```rust,ignore
/// let comparator = Comparator::new(ai, fetcher, searcher)
///     .with_config(CompareConfig::default().with_min_common(3));
///
/// let response = comparator
///     .compare(&CompareRequest::new("LM7805 voltage regulator"))
///     .await?;
///
/// for record in response.ok_records() {
///     println!("{}: {:?}", record.url, record.specs);
/// }
/// ```
pub struct Comparator<A: AI, F: Fetcher, S: WebSearcher> {
    ai: A,
    fetcher: F,
    searcher: S,
    converters: ConverterSet,
    config: CompareConfig,
}

impl<A: AI, F: Fetcher, S: WebSearcher> Comparator<A, F, S> {
    /// Create a comparator with default configuration and converters.
    pub fn new(ai: A, fetcher: F, searcher: S) -> Self {
        Self {
            ai,
            fetcher,
            searcher,
            converters: ConverterSet::default(),
            config: CompareConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompareConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the document converters (tests use mock converters).
    pub fn with_converters(mut self, converters: ConverterSet) -> Self {
        self.converters = converters;
        self
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CompareConfig {
        &mut self.config
    }

    /// Discover candidates for the query, then compare them.
    pub async fn compare(&self, request: &CompareRequest) -> Result<ComparisonResponse> {
        self.with_request_timeout(self.run(Uuid::now_v7(), request, None))
            .await
    }

    /// Compare an explicit candidate list, skipping discovery.
    pub async fn compare_sources(
        &self,
        request: &CompareRequest,
        sources: Vec<CandidateSource>,
    ) -> Result<ComparisonResponse> {
        self.with_request_timeout(self.run(Uuid::now_v7(), request, Some(sources)))
            .await
    }

    async fn with_request_timeout(
        &self,
        run: impl std::future::Future<Output = Result<ComparisonResponse>>,
    ) -> Result<ComparisonResponse> {
        let budget = self.config.request_timeout();
        match tokio::time::timeout(budget, run).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = budget.as_millis() as u64;
                warn!(elapsed_ms, "Comparison exceeded request budget");
                Err(CompareError::Timeout { elapsed_ms })
            }
        }
    }

    #[instrument(skip_all, fields(request_id = %request_id, query = %request.query, kind = %request.kind))]
    async fn run(
        &self,
        request_id: Uuid,
        request: &CompareRequest,
        sources: Option<Vec<CandidateSource>>,
    ) -> Result<ComparisonResponse> {
        let started = Instant::now();
        let mut timings = StageTimings::default();
        let mut failures: Vec<SourceFailure> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // 1. Discovery
        let sources = match sources {
            Some(sources) => sources,
            None => {
                let stage = Instant::now();
                let count = request.count.unwrap_or(self.config.discover.default_count);
                let found = Discoverer::new(&self.searcher, &self.config.discover)
                    .discover(
                        &request.query,
                        request.kind,
                        request.supplier_name.as_deref(),
                        count,
                    )
                    .await?;
                timings.discover = stage.elapsed();
                found
            }
        };

        if sources.is_empty() {
            warn!("No candidate sources");
            return Err(CompareError::NoUsableSources { failures });
        }

        // 2. Acquisition
        let stage = Instant::now();
        let acquired = Acquirer::new(&self.fetcher, &self.converters, &self.config.acquire)
            .acquire_all(&sources)
            .await;
        timings.acquire = stage.elapsed();

        let acquire_failed: Vec<bool> = acquired.iter().map(AcquiredContent::is_failed).collect();
        for content in &acquired {
            if let Some(e) = content.error() {
                failures.push(SourceFailure::acquisition(content.url(), e));
            }
        }

        // 3. Normalization
        let stage = Instant::now();
        let normalized = ContentNormalizer::new(&self.converters, &self.config.normalize)
            .normalize_all(acquired)
            .await;
        timings.normalize = stage.elapsed();

        let mut ready = Vec::new();
        let mut unreadable: Vec<(String, String)> = Vec::new();
        for (content, was_failed) in normalized.into_iter().zip(acquire_failed) {
            match content.error() {
                Some(e) if !was_failed => {
                    failures.push(SourceFailure::normalization(content.url(), e));
                    unreadable.push((content.url().to_string(), e.to_string()));
                }
                Some(_) => {}
                None => ready.push(content),
            }
        }

        if self.config.debug.enabled {
            if let Some(dir) = &self.config.debug.dump_dir {
                dump_markdown(dir, &ready).await;
            }
        }

        if ready.is_empty() {
            warn!(failed = failures.len(), "No source survived acquisition");
            return Err(CompareError::NoUsableSources { failures });
        }

        // 4. Extraction
        let stage = Instant::now();
        let mut extract_config = self.config.extract.clone();
        if request.category_hint.is_some() {
            extract_config.category_hint = request.category_hint.clone();
        }

        let inputs: Vec<ExtractionInput<'_>> = ready
            .iter()
            .filter_map(|c| c.text().map(|text| ExtractionInput::new(&c.resolved_url, text)))
            .collect();
        let outcomes = AttributeExtractor::new(&self.ai, &extract_config)
            .extract_all(&inputs)
            .await;
        timings.extract = stage.elapsed();

        let mut sets: Vec<RawAttributeSet> = Vec::new();
        let mut extract_failures = Vec::new();
        for (input, outcome) in inputs.iter().zip(outcomes) {
            match outcome {
                Ok(set) => sets.push(set),
                Err(e) => {
                    failures.push(SourceFailure::extraction(input.url, &e));
                    extract_failures.push((input.url.to_string(), e));
                }
            }
        }

        if sets.is_empty() {
            warn!(failed = failures.len(), "No source produced attributes");
            return Err(CompareError::NoUsableSources { failures });
        }

        let min_documents = self.config.extract.min_documents;
        let (status, columns, mut records) = if sets.len() < min_documents {
            warnings.push(format!(
                "Only {} of {} sources produced attributes; at least {} are needed to compare",
                sets.len(),
                sources.len(),
                min_documents
            ));
            let records: Vec<ComparableRecord> = sets.iter().map(raw_record).collect();
            (ComparisonStatus::Uncompared, Vec::new(), records)
        } else {
            // 5. Key normalization
            let stage = Instant::now();
            let mapping = KeyNormalizer::new(&self.ai, &self.config.keys)
                .normalize_keys(&sets)
                .await;
            timings.key_normalize = stage.elapsed();

            if mapping.fallback {
                warnings.push(
                    "Attribute names could not be grouped; columns use the first source's names"
                        .to_string(),
                );
            }

            // 6. Selection
            let stage = Instant::now();
            let selection = CoverageSelector::new(&self.config.selector).select(&mapping);
            timings.select = stage.elapsed();

            if selection.keep_everyone {
                warnings.push(format!(
                    "Sources share fewer than {} attributes; all sources kept",
                    selection.required_overlap
                ));
            }
            if !selection.pruned.is_empty() {
                let urls: Vec<&str> = selection
                    .pruned
                    .iter()
                    .filter_map(|&i| sets.get(i).map(|s| s.source_url.as_str()))
                    .collect();
                warnings.push(format!(
                    "Dropped {} source(s) sharing fewer than {} attributes with the rest: {}",
                    urls.len(),
                    selection.required_overlap,
                    urls.join(", ")
                ));
            }

            // 7. Assembly
            let columns = build_columns(&mapping, &selection);
            let records = assemble_records(&sets, &mapping, &selection);

            let degraded = !failures.is_empty()
                || mapping.fallback
                || selection.keep_everyone
                || !selection.pruned.is_empty();
            let status = if degraded {
                ComparisonStatus::Degraded
            } else {
                ComparisonStatus::Complete
            };
            (status, columns, records)
        };

        for (url, error) in unreadable {
            records.push(ComparableRecord::failed(url, &columns, error));
        }
        for (url, error) in &extract_failures {
            records.push(ComparableRecord::failed(url.clone(), &columns, error.to_string()));
        }

        let stage = Instant::now();
        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        let contacts = ContactResolver::new(&self.fetcher, &self.config.contact)
            .resolve_all(&urls)
            .await;
        for (record, contact) in records.iter_mut().zip(contacts) {
            record.contact_url = contact;
        }
        timings.contact = stage.elapsed();
        timings.total = started.elapsed();

        info!(
            status = ?status,
            columns = columns.len(),
            records = records.len(),
            failures = failures.len(),
            duration_ms = timings.total.as_millis() as u64,
            "Comparison complete"
        );

        Ok(ComparisonResponse {
            request_id,
            query: request.query.clone(),
            status,
            columns,
            records,
            failures,
            warnings,
            timings: self.config.debug.enabled.then_some(timings),
            created_at: chrono::Utc::now(),
        })
    }
}

/// Write each source's normalized markdown for inspection.
///
/// Failures are logged and otherwise ignored.
async fn dump_markdown(dir: &Path, contents: &[AcquiredContent]) {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %e, "Cannot create debug directory");
        return;
    }

    for content in contents {
        let (Some(text), Some(hash)) = (content.text(), content.text_hash()) else {
            continue;
        };
        let path = dir.join(format!("markdown_{}.md", hash));
        let body = format!("<!-- {} -->\n\n{}", content.resolved_url, text);
        if let Err(e) = tokio::fs::write(&path, body).await {
            warn!(path = %path.display(), error = %e, "Cannot write debug markdown");
        }
    }
}
