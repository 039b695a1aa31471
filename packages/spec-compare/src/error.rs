//! Typed errors for the comparison library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Per-source failures
//! ([`AcquireError`], [`ExtractError`]) are recorded on results and never
//! abort a request; only [`CompareError`] escapes to the caller.

use thiserror::Error;

use crate::types::record::{ErrorKind, SourceFailure};

/// Request-level errors.
#[derive(Debug, Error)]
pub enum CompareError {
    /// Generative capability unavailable or failed
    #[error("AI service error: {0}")]
    Ai(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Web search failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Fetch failed outside of per-source acquisition
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Document conversion failed outside of per-source normalization
    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// The whole request exceeded its time budget
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Invalid query provided
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Every candidate failed before producing attributes
    #[error("no usable sources ({} attempted)", failures.len())]
    NoUsableSources { failures: Vec<SourceFailure> },
}

/// Errors from the byte-level fetch capability.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Security validation failed
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Connection, TLS or body read failure
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors from document conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The document could not be parsed
    #[error("unreadable document: {0}")]
    Unreadable(String),

    /// Conversion produced no text
    #[error("document produced no text")]
    Empty,

    /// The blocking conversion task panicked or was cancelled
    #[error("conversion task failed: {0}")]
    Task(String),
}

/// Why a single source failed acquisition or normalization.
///
/// Cloneable so it can be carried on [`crate::AcquiredContent`] and
/// reported on the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Network failure
    #[error("network error: {0}")]
    Network(String),

    /// Per-source time budget exceeded
    #[error("timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Non-success HTTP status
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// Body is not the expected document format
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Document is smaller than the size floor
    #[error("document too small ({size} bytes, minimum {min})")]
    Corrupted { size: usize, min: usize },

    /// Document exceeds the page ceiling
    #[error("document has {pages} pages (max {max})")]
    PageCountExceeded { pages: usize, max: usize },

    /// Conversion produced too little text
    #[error("insufficient content ({chars} chars, minimum {min})")]
    NoContent { chars: usize, min: usize },

    /// Conversion failed to produce any text
    #[error("no text extracted: {0}")]
    Unextractable(String),

    /// URL rejected by the security validator
    #[error("blocked: {0}")]
    Blocked(String),
}

impl AcquireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http { .. } => ErrorKind::Http,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::Corrupted { .. } => ErrorKind::Corrupted,
            Self::PageCountExceeded { .. } => ErrorKind::PageCountExceeded,
            Self::NoContent { .. } | Self::Unextractable(_) => ErrorKind::NoContent,
            Self::Blocked(_) => ErrorKind::Blocked,
        }
    }
}

impl From<ConvertError> for AcquireError {
    fn from(err: ConvertError) -> Self {
        Self::Unextractable(err.to_string())
    }
}

impl From<FetchError> for AcquireError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Security(e) => Self::Blocked(e.to_string()),
            FetchError::Status { status, .. } => Self::Http { status },
            FetchError::Network(e) => Self::Network(e.to_string()),
            FetchError::Timeout { .. } => Self::Timeout { elapsed_ms: 0 },
            FetchError::InvalidUrl { url } => Self::InvalidFormat(format!("invalid URL: {}", url)),
        }
    }
}

/// Why attribute extraction failed for one document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The generative call itself failed
    #[error("AI call failed: {0}")]
    Ai(String),

    /// The response could not be parsed, even after repair
    #[error("unparseable response: {0}")]
    Unparseable(String),

    /// The response parsed but carried no attributes
    #[error("no attributes extracted")]
    NoAttributes,

    /// A batched response omitted this document
    #[error("document {index} missing from batch response")]
    MissingFromBatch { index: usize },
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for request-level operations.
pub type Result<T> = std::result::Result<T, CompareError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for conversion operations.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_maps_to_acquire_error() {
        let err: AcquireError = FetchError::Status {
            status: 404,
            url: "https://example.com/a.pdf".into(),
        }
        .into();
        assert_eq!(err, AcquireError::Http { status: 404 });
        assert_eq!(err.kind(), ErrorKind::Http);

        let err: AcquireError = FetchError::Security(SecurityError::NoHost).into();
        assert_eq!(err.kind(), ErrorKind::Blocked);
    }

    #[test]
    fn test_no_usable_sources_message_counts_failures() {
        let err = CompareError::NoUsableSources {
            failures: vec![SourceFailure::acquisition(
                "https://a.example/x.pdf",
                &AcquireError::Http { status: 500 },
            )],
        };
        assert_eq!(err.to_string(), "no usable sources (1 attempted)");
    }
}
