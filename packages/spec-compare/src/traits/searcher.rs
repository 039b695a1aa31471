//! Web search capability used by discovery.
//!
//! A searcher returns ranked hits for a query string. Deciding which hits
//! are datasheets or supplier pages happens in [`crate::pipeline::discover`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{CompareError, Result};
use crate::security::SecretString;
use crate::types::source::{CandidateSource, SourceKind};

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub url: Url,
    pub title: Option<String>,

    /// Page excerpt as returned by the search service
    pub snippet: Option<String>,

    /// Service-assigned relevance; higher ranks first
    pub score: Option<f32>,
}

impl SearchResult {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title: None,
            snippet: None,
            score: None,
        }
    }

    /// `None` when the string is not an absolute URL.
    pub fn from_url(url: &str) -> Option<Self> {
        Url::parse(url).ok().map(Self::new)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// A candidate of the given kind; unscored hits rank last.
    pub fn into_candidate(self, kind: SourceKind) -> CandidateSource {
        let mut candidate =
            CandidateSource::new(self.url.to_string(), kind).with_score(self.score.unwrap_or(0.0));
        candidate.title = self.title;
        candidate
    }
}

/// Finds candidate URLs for a product query.
///
/// ```rust,ignore
/// let searcher = TavilyWebSearcher::from_env()?;
/// let hits = searcher.search("LM7805 datasheet pdf", 15).await?;
/// ```
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web, returning at most `limit` hits in rank order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// Canned search results keyed by exact query.
///
/// Queries without an entry get the fallback list (empty unless set).
/// Every query received is recorded for assertions.
#[derive(Default)]
pub struct MockWebSearcher {
    by_query: RwLock<HashMap<String, Vec<SearchResult>>>,
    fallback: Vec<SearchResult>,
    queries: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.by_query
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// URLs as hits scored from 1.0 downwards, in the given order.
    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        let results = ranked(urls);
        self.with_results(query, results)
    }

    pub fn with_fallback_urls(mut self, urls: &[&str]) -> Self {
        self.fallback = ranked(urls);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

fn ranked(urls: &[&str]) -> Vec<SearchResult> {
    let step = 1.0 / urls.len().max(1) as f32;
    urls.iter()
        .enumerate()
        .filter_map(|(rank, url)| {
            SearchResult::from_url(url).map(|hit| hit.with_score(1.0 - rank as f32 * step))
        })
        .collect()
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        self.queries.write().unwrap().push(query.to_string());

        let hits = self.by_query.read().unwrap().get(query).cloned();
        Ok(hits
            .unwrap_or_else(|| self.fallback.clone())
            .into_iter()
            .take(limit)
            .collect())
    }
}

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Tavily caps `max_results` at this value.
const TAVILY_MAX_RESULTS: usize = 20;

/// Tavily-backed web searcher.
pub struct TavilyWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    advanced: bool,
    exclude_domains: Vec<String>,
}

impl TavilyWebSearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_key(SecretString::new(api_key))
    }

    /// Create from `TAVILY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        SecretString::from_env("TAVILY_API_KEY").map(Self::with_key)
    }

    fn with_key(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            client,
            advanced: false,
            exclude_domains: Vec::new(),
        }
    }

    /// Use "advanced" depth (slower, more relevant).
    pub fn with_advanced_depth(mut self) -> Self {
        self.advanced = true;
        self
    }

    /// Domains Tavily should leave out of its results.
    pub fn with_excluded_domains(mut self, domains: &[&str]) -> Self {
        self.exclude_domains = domains.iter().map(|d| d.to_string()).collect();
        self
    }
}

#[derive(serde::Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude_domains: Option<&'a [String]>,
}

#[derive(serde::Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(serde::Deserialize)]
struct TavilyHit {
    url: String,
    title: Option<String>,
    content: Option<String>,
    score: Option<f32>,
}

/// Hits from a Tavily response body, skipping unparseable URLs.
fn parse_tavily_results(body: &str) -> Result<Vec<SearchResult>> {
    let response: TavilyResponse =
        serde_json::from_str(body).map_err(|e| CompareError::Search(Box::new(e)))?;

    Ok(response
        .results
        .into_iter()
        .filter_map(|hit| {
            let mut result = SearchResult::from_url(&hit.url)?;
            result.title = hit.title.filter(|t| !t.trim().is_empty());
            result.snippet = hit.content;
            result.score = hit.score;
            Some(result)
        })
        .collect())
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let request = TavilyRequest {
            query,
            search_depth: if self.advanced { "advanced" } else { "basic" },
            max_results: limit.clamp(1, TAVILY_MAX_RESULTS),
            exclude_domains: (!self.exclude_domains.is_empty())
                .then_some(self.exclude_domains.as_slice()),
        };

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| CompareError::Search(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompareError::Search(
                format!("Tavily returned {}", status).into(),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CompareError::Search(Box::new(e)))?;
        let mut results = parse_tavily_results(&body)?;
        results.truncate(limit);

        debug!(query, hits = results.len(), "Tavily search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_web_searcher() {
        let searcher = MockWebSearcher::new().with_urls(
            "lm7805 datasheet",
            &["https://ti.com/lit/lm7805.pdf", "https://st.com/l78.pdf"],
        );

        let results = searcher.search("lm7805 datasheet", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url.as_str(), "https://ti.com/lit/lm7805.pdf");
        assert!(results[0].score > results[1].score);
        assert_eq!(searcher.queries(), vec!["lm7805 datasheet"]);
    }

    #[tokio::test]
    async fn test_search_limit_and_fallback() {
        let searcher = MockWebSearcher::new().with_fallback_urls(&[
            "https://a.com",
            "https://b.com",
            "https://c.com",
        ]);

        let results = searcher.search("anything", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_into_candidate() {
        let candidate = SearchResult::from_url("https://a.com/x.pdf")
            .unwrap()
            .with_title("X")
            .with_score(0.4)
            .into_candidate(SourceKind::Datasheet);

        assert_eq!(candidate.url, "https://a.com/x.pdf");
        assert_eq!(candidate.score, 0.4);
        assert_eq!(candidate.title.as_deref(), Some("X"));
    }

    #[test]
    fn test_parse_tavily_results() {
        let body = r#"{
            "query": "lm7805 datasheet pdf",
            "results": [
                {"url": "https://ti.example/lm7805.pdf", "title": "LM7805", "content": "5 V regulator", "score": 0.91},
                {"url": "not a url", "title": "broken", "score": 0.5},
                {"url": "https://st.example/l78.pdf", "title": " ", "score": 0.42}
            ]
        }"#;

        let results = parse_tavily_results(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet.as_deref(), Some("5 V regulator"));
        assert_eq!(results[0].score, Some(0.91));
        assert_eq!(results[1].title, None);
    }

    #[test]
    fn test_parse_tavily_error_body() {
        assert!(matches!(
            parse_tavily_results("<html>502</html>"),
            Err(CompareError::Search(_))
        ));
        assert!(parse_tavily_results("{}").unwrap().is_empty());
    }
}
