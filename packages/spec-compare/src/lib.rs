//! Multi-Source Specification Comparison Library
//!
//! Finds datasheets or supplier pages for a product query, extracts their
//! technical attributes, reconciles differently-named attributes across
//! sources and returns a comparison table.
//!
//! # Design Philosophy
//!
//! - Sources fail independently; one bad URL never sinks a comparison
//! - The model proposes, the pipeline verifies: every column mapping
//!   points at a key that really exists in its source
//! - Degraded results are labeled, never silently empty
//! - Library handles mechanics, the caller composes capabilities
//!
//! # Usage
//!
//! ```rust,ignore
//! use spec_compare::{Comparator, CompareRequest, HttpFetcher, TavilyWebSearcher, ValidatedFetcher};
//! use spec_compare::ai::Anthropic;
//!
//! let comparator = Comparator::new(
//!     Anthropic::from_env()?,
//!     ValidatedFetcher::new(HttpFetcher::new()),
//!     TavilyWebSearcher::from_env()?,
//! );
//!
//! let response = comparator
//!     .compare(&CompareRequest::new("LM7805 voltage regulator").with_count(5))
//!     .await?;
//!
//! for column in &response.columns {
//!     println!("{} ({} sources)", column.display_name, column.coverage);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability abstractions (AI, WebSearcher, Fetcher, DocumentConverter)
//! - [`types`] - Data types flowing between stages
//! - [`pipeline`] - The comparison stages and the [`Comparator`]
//! - [`fetchers`] - HTTP, SSRF-guarded and mock fetchers
//! - [`converters`] - PDF and HTML to markdown
//! - [`security`] - Credential handling and SSRF protection
//! - [`testing`] - Mock implementations for testing

pub mod converters;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "anthropic")]
pub mod ai;

// Re-export core types at crate root
pub use error::{
    AcquireError, CompareError, ConvertError, ExtractError, FetchError, Result, SecurityError,
};
pub use traits::{
    ai::{AiTask, GenerateRequest, AI},
    converter::DocumentConverter,
    fetcher::{FetchedBody, Fetcher},
    searcher::{MockWebSearcher, SearchResult, TavilyWebSearcher, WebSearcher},
};
pub use types::{
    attributes::RawAttributeSet,
    config::{
        AcquireConfig, CompareConfig, ContactConfig, DebugConfig, DiscoverConfig, ExtractConfig,
        ExtractMode, KeyNormalizerConfig, NormalizeConfig, SelectorConfig,
    },
    content::{AcquiredContent, ContentState, DocumentFormat},
    mapping::{CanonicalKey, CanonicalKeyMapping},
    record::{
        Column, ComparableRecord, ComparisonResponse, ComparisonStatus, ErrorKind, FailureStage,
        RecordStatus, SourceFailure, StageTimings, NOT_AVAILABLE,
    },
    source::{CandidateSource, SourceKind},
};

// Re-export the entry point and stages
pub use pipeline::{
    Acquirer, AttributeExtractor, CompareRequest, Comparator, ContactResolver, ContentNormalizer,
    CoverageSelector, Discoverer, KeyNormalizer, Selection,
};

// Re-export capability implementations
pub use converters::{ConverterSet, HtmlConverter, PdfConverter};
pub use fetchers::{HttpFetcher, MockFetcher, ValidatedFetcher};
pub use security::{SecretString, UrlValidator};

// Re-export testing utilities
pub use testing::{MockAI, MockConverter, MockReply};
