//! AI trait for generative operations.
//!
//! The pipeline needs exactly one capability from a model: turn a
//! prompt into text, optionally asking for JSON. Prompting and response
//! parsing live in the pipeline so every provider behaves the same.

use async_trait::async_trait;

use crate::error::Result;

/// What a generative call is for. Used for logging and test scripting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiTask {
    /// Attributes from a single document
    ExtractAttributes,

    /// Attributes from several documents in one call
    ExtractBatch,

    /// Grouping attribute names across documents
    GroupKeys,
}

impl AiTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractAttributes => "extract_attributes",
            Self::ExtractBatch => "extract_batch",
            Self::GroupKeys => "group_keys",
        }
    }
}

/// A single generative request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub task: AiTask,

    /// System instruction
    pub system: String,

    /// User prompt
    pub prompt: String,

    /// Ask for a JSON object response
    pub json: bool,

    /// Optional JSON schema the response should follow
    pub schema: Option<serde_json::Value>,

    /// Output token limit
    pub max_tokens: u32,
}

impl GenerateRequest {
    pub fn new(task: AiTask, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            task,
            system: system.into(),
            prompt: prompt.into(),
            json: false,
            schema: None,
            max_tokens: 4096,
        }
    }

    /// Request a JSON object response.
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.json = true;
        self.schema = Some(schema);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// AI trait for LLM operations.
///
/// Implementations wrap specific LLM providers and return the raw text
/// of the reply. Callers treat the text as untrusted: JSON is repaired
/// and validated downstream.
#[async_trait]
pub trait AI: Send + Sync {
    /// Generate a completion for the request.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}
