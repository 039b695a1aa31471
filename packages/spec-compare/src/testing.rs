//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the comparison
//! library without making real AI or network calls.

pub use crate::fetchers::MockFetcher;
pub use crate::traits::searcher::MockWebSearcher;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{CompareError, ConvertError, ConvertResult, Result};
use crate::traits::ai::{AiTask, GenerateRequest, AI};
use crate::traits::converter::DocumentConverter;

// =============================================================================
// MockAI
// =============================================================================

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text verbatim
    Text(String),

    /// Fail the call
    Error(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

type Predicate = Box<dyn Fn(&GenerateRequest) -> bool + Send + Sync>;

struct Rule {
    matches: Predicate,
    reply: MockReply,
}

/// A mock AI implementation for testing.
///
/// Replies are scripted with rules checked in insertion order; the first
/// matching rule answers. Without a match the default reply is used, and
/// without a default the call fails. Every request is recorded.
///
/// # Example
///
/// ```rust
/// use spec_compare::testing::{MockAI, MockReply};
/// use spec_compare::AiTask;
///
/// let ai = MockAI::new()
///     .with_reply_containing("BROKEN", MockReply::error("overloaded"))
///     .with_task_reply(AiTask::GroupKeys, MockReply::text("{}"));
/// ```
#[derive(Clone, Default)]
pub struct MockAI {
    rules: Arc<RwLock<Vec<Rule>>>,
    default_reply: Arc<RwLock<Option<MockReply>>>,
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<GenerateRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockAI {
    /// Create a new mock AI with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests matching the predicate.
    pub fn with_rule(
        self,
        predicate: impl Fn(&GenerateRequest) -> bool + Send + Sync + 'static,
        reply: MockReply,
    ) -> Self {
        self.rules.write().unwrap().push(Rule {
            matches: Box::new(predicate),
            reply,
        });
        self
    }

    /// Answer requests whose prompt contains `needle`.
    pub fn with_reply_containing(self, needle: impl Into<String>, reply: MockReply) -> Self {
        let needle = needle.into();
        self.with_rule(move |req| req.prompt.contains(&needle), reply)
    }

    /// Answer every request of a task.
    pub fn with_task_reply(self, task: AiTask, reply: MockReply) -> Self {
        self.with_rule(move |req| req.task == task, reply)
    }

    /// Answer requests of a task whose prompt contains `needle`.
    pub fn with_task_reply_containing(
        self,
        task: AiTask,
        needle: impl Into<String>,
        reply: MockReply,
    ) -> Self {
        let needle = needle.into();
        self.with_rule(move |req| req.task == task && req.prompt.contains(&needle), reply)
    }

    /// Reply used when no rule matches.
    pub fn with_default(self, reply: MockReply) -> Self {
        *self.default_reply.write().unwrap() = Some(reply);
        self
    }

    /// Delay every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all requests made to this mock.
    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Number of requests of one task.
    pub fn calls_for(&self, task: AiTask) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.task == task)
            .count()
    }

    /// Highest number of calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn reply_for(&self, request: &GenerateRequest) -> Option<MockReply> {
        let rules = self.rules.read().unwrap();
        rules
            .iter()
            .find(|r| (r.matches)(request))
            .map(|r| r.reply.clone())
            .or_else(|| self.default_reply.read().unwrap().clone())
    }
}

#[async_trait]
impl AI for MockAI {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.calls.write().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.reply_for(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(message)) => Err(CompareError::Ai(message.into())),
            None => Err(CompareError::Ai(
                format!("no scripted reply for {}", request.task.as_str()).into(),
            )),
        }
    }
}

// =============================================================================
// MockConverter
// =============================================================================

/// A mock document converter.
///
/// Treats the bytes as UTF-8 text: `%`-prefixed lines (PDF header and
/// padding from [`fake_pdf`]) are dropped and the rest is the markdown.
/// Page counts default to 1 and can be scripted by body content.
#[derive(Clone, Default)]
pub struct MockConverter {
    pages: Arc<RwLock<HashMap<String, usize>>>,
    failure: Option<String>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents whose body contains `needle` report `pages` pages.
    pub fn with_pages(self, needle: impl Into<String>, pages: usize) -> Self {
        self.pages.write().unwrap().insert(needle.into(), pages);
        self
    }

    /// Fail every conversion.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl DocumentConverter for MockConverter {
    async fn page_count(&self, bytes: &[u8]) -> ConvertResult<usize> {
        if let Some(message) = &self.failure {
            return Err(ConvertError::Unreadable(message.clone()));
        }

        let text = String::from_utf8_lossy(bytes);
        let pages = self.pages.read().unwrap();
        Ok(pages
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, pages)| *pages)
            .unwrap_or(1))
    }

    async fn to_markdown(&self, bytes: &[u8]) -> ConvertResult<String> {
        if let Some(message) = &self.failure {
            return Err(ConvertError::Unreadable(message.clone()));
        }

        let text = String::from_utf8_lossy(bytes);
        let markdown = text
            .lines()
            .filter(|line| !line.starts_with('%'))
            .collect::<Vec<_>>()
            .join("\n");

        if markdown.trim().is_empty() {
            return Err(ConvertError::Empty);
        }
        Ok(markdown)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Bytes that pass datasheet validation and convert (via
/// [`MockConverter`]) back to `text`.
pub fn fake_pdf(text: &str) -> Vec<u8> {
    let mut body = format!("%PDF-1.4\n{}\n", text);
    while body.len() < 1100 {
        body.push_str("% padding padding padding padding\n");
    }
    body.into_bytes()
}

/// Document text long enough to pass normalization.
pub fn datasheet_text(name: &str, specs: &[(&str, &str)]) -> String {
    let mut text = format!("# {} Datasheet\n\n{} product overview and ratings.\n\n", name, name);
    text.push_str("| Parameter | Value |\n| --- | --- |\n");
    for (key, value) in specs {
        text.push_str(&format!("| {} | {} |\n", key, value));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_ai_rule_order() {
        let ai = MockAI::new()
            .with_reply_containing("special", MockReply::text("first"))
            .with_task_reply(AiTask::GroupKeys, MockReply::text("second"))
            .with_default(MockReply::text("fallback"));

        let special = GenerateRequest::new(AiTask::GroupKeys, "", "a special prompt");
        let group = GenerateRequest::new(AiTask::GroupKeys, "", "plain");
        let other = GenerateRequest::new(AiTask::ExtractBatch, "", "plain");

        assert_eq!(ai.generate(&special).await.unwrap(), "first");
        assert_eq!(ai.generate(&group).await.unwrap(), "second");
        assert_eq!(ai.generate(&other).await.unwrap(), "fallback");
        assert_eq!(ai.call_count(), 3);
        assert_eq!(ai.calls_for(AiTask::GroupKeys), 2);
    }

    #[tokio::test]
    async fn test_mock_ai_unscripted_fails() {
        let ai = MockAI::new();
        let request = GenerateRequest::new(AiTask::ExtractAttributes, "", "x");
        assert!(matches!(ai.generate(&request).await, Err(CompareError::Ai(_))));
    }

    #[tokio::test]
    async fn test_mock_converter_round_trips_fake_pdf() {
        let converter = MockConverter::new().with_pages("BIG", 12);
        let small = fake_pdf("Output Voltage 5V");
        let big = fake_pdf("BIG catalog");

        assert!(small.len() >= 1024);
        assert_eq!(converter.to_markdown(&small).await.unwrap(), "Output Voltage 5V");
        assert_eq!(converter.page_count(&small).await.unwrap(), 1);
        assert_eq!(converter.page_count(&big).await.unwrap(), 12);
    }

    #[test]
    fn test_datasheet_text_passes_minimum() {
        let text = datasheet_text("LM7805", &[("Output Voltage", "5 V")]);
        assert!(text.chars().count() >= 100);
        assert!(text.contains("| Output Voltage | 5 V |"));
    }
}
