//! Candidate sources - URLs proposed by discovery.

use serde::{Deserialize, Serialize};

/// What kind of document a candidate is expected to be.
///
/// The kind selects acquisition rules: datasheets must be PDFs (with an
/// HTML link-following fallback and a page ceiling), pages are HTML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Product datasheet (PDF)
    #[default]
    Datasheet,

    /// Supplier or product web page (HTML)
    Page,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Datasheet => "datasheet",
            Self::Page => "page",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "datasheet" | "datasheets" | "pdf" => Ok(Self::Datasheet),
            "page" | "pages" | "supplier" | "html" => Ok(Self::Page),
            other => Err(format!("unknown source kind: {}", other)),
        }
    }
}

/// A URL proposed by discovery, with its search score.
///
/// Candidates are immutable once created; each pipeline stage produces a
/// new value that refers back to its candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSource {
    /// URL to acquire
    pub url: String,

    /// Relevance score from the searcher (higher is better)
    pub score: f32,

    /// Title from the search result, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Expected document kind
    pub kind: SourceKind,
}

impl CandidateSource {
    /// Create a candidate with a zero score.
    pub fn new(url: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            url: url.into(),
            score: 0.0,
            title: None,
            kind,
        }
    }

    /// Shorthand for a datasheet candidate.
    pub fn datasheet(url: impl Into<String>) -> Self {
        Self::new(url, SourceKind::Datasheet)
    }

    /// Shorthand for a web page candidate.
    pub fn page(url: impl Into<String>) -> Self {
        Self::new(url, SourceKind::Page)
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
