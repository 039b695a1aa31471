//! Acquired content - the per-source result of acquisition and normalization.

use sha2::{Digest, Sha256};

use crate::error::AcquireError;
use crate::types::source::CandidateSource;

/// Format of a downloaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Html,
}

/// Where a source sits in the acquire → normalize progression.
///
/// Failure carries no body or text, and normalized text is never empty.
#[derive(Debug, Clone)]
pub enum ContentState {
    /// Bytes downloaded and validated, not yet converted
    Downloaded {
        bytes: Vec<u8>,
        format: DocumentFormat,
        page_count: Option<usize>,
    },

    /// Converted to bounded markdown, ready for extraction
    Normalized {
        text: String,
        format: DocumentFormat,
        truncated: bool,
    },

    /// Acquisition or normalization failed
    Failed(AcquireError),
}

/// Outcome of acquiring one candidate source.
#[derive(Debug, Clone)]
pub struct AcquiredContent {
    /// The candidate this content came from
    pub source: CandidateSource,

    /// URL the bytes were actually read from (differs from the candidate
    /// URL when a datasheet link was followed from an HTML page)
    pub resolved_url: String,

    /// Current state
    pub state: ContentState,
}

impl AcquiredContent {
    /// Successful download.
    pub fn downloaded(
        source: CandidateSource,
        resolved_url: impl Into<String>,
        bytes: Vec<u8>,
        format: DocumentFormat,
        page_count: Option<usize>,
    ) -> Self {
        Self {
            source,
            resolved_url: resolved_url.into(),
            state: ContentState::Downloaded {
                bytes,
                format,
                page_count,
            },
        }
    }

    /// Failed acquisition.
    pub fn failed(source: CandidateSource, error: AcquireError) -> Self {
        let resolved_url = source.url.clone();
        Self {
            source,
            resolved_url,
            state: ContentState::Failed(error),
        }
    }

    /// Attach normalized text, consuming the downloaded bytes.
    ///
    /// Empty text becomes a [`AcquireError::NoContent`] failure.
    pub fn with_text(self, text: String, truncated: bool) -> Self {
        let format = match &self.state {
            ContentState::Downloaded { format, .. } | ContentState::Normalized { format, .. } => {
                *format
            }
            ContentState::Failed(_) => return self,
        };

        if text.trim().is_empty() {
            return self.into_failed(AcquireError::NoContent { chars: 0, min: 1 });
        }

        Self {
            state: ContentState::Normalized {
                text,
                format,
                truncated,
            },
            ..self
        }
    }

    /// Replace the state with a failure, dropping any body or text.
    pub fn into_failed(self, error: AcquireError) -> Self {
        Self {
            state: ContentState::Failed(error),
            ..self
        }
    }

    pub fn url(&self) -> &str {
        &self.source.url
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ContentState::Failed(_))
    }

    pub fn error(&self) -> Option<&AcquireError> {
        match &self.state {
            ContentState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.state {
            ContentState::Downloaded { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// Normalized text, present only after successful normalization.
    pub fn text(&self) -> Option<&str> {
        match &self.state {
            ContentState::Normalized { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        match &self.state {
            ContentState::Downloaded { format, .. } | ContentState::Normalized { format, .. } => {
                Some(*format)
            }
            ContentState::Failed(_) => None,
        }
    }

    /// Short content hash, used to name debug artifacts.
    pub fn text_hash(&self) -> Option<String> {
        self.text().map(|text| {
            let digest = Sha256::digest(text.as_bytes());
            hex::encode(&digest[..8])
        })
    }
}
