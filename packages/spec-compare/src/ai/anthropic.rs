//! Anthropic implementation of the AI trait.
//!
//! A reference implementation on the Messages API. JSON requests get a
//! JSON-only instruction (plus the schema, when one is attached) and an
//! assistant prefill of `{` so the reply starts inside the object.
//!
//! # Example
//!
//! ```rust,ignore
//! use spec_compare::ai::Anthropic;
//!
//! let ai = Anthropic::from_env()?.with_model("claude-3-5-sonnet-latest");
//! let comparator = Comparator::new(ai, fetcher, searcher);
//! ```

use anthropic_client::{AnthropicClient, Message, MessagesRequest, DEFAULT_MODEL};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CompareError, Result};
use crate::traits::ai::{GenerateRequest, AI};

const JSON_INSTRUCTION: &str =
    "\n\nRespond only with valid JSON. Do not wrap it in code fences or add commentary.";

/// Anthropic-based AI implementation.
#[derive(Clone)]
pub struct Anthropic {
    client: AnthropicClient,
    model: String,
    max_retries: u32,
}

impl Anthropic {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: AnthropicClient::new(api_key),
            model: DEFAULT_MODEL.to_string(),
            max_retries: 2,
        }
    }

    /// Create from `ANTHROPIC_API_KEY`, with the model from
    /// `ANTHROPIC_MODEL` when set.
    pub fn from_env() -> Result<Self> {
        let client = AnthropicClient::from_env().map_err(|e| CompareError::Config(e.to_string()))?;
        let model = std::env::var("ANTHROPIC_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            client,
            model,
            max_retries: 2,
        })
    }

    /// Set the model (default: [`DEFAULT_MODEL`]).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies, gateways, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// Retries on rate limits, overloads and network errors (default: 2).
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &GenerateRequest) -> MessagesRequest {
        let mut system = request.system.clone();
        if request.json {
            system.push_str(JSON_INSTRUCTION);
            if let Some(schema) = &request.schema {
                let schema = serde_json::to_string_pretty(schema).unwrap_or_default();
                system.push_str("\n\nThe JSON must match this schema:\n");
                system.push_str(&schema);
            }
        }

        let mut messages = MessagesRequest::new(&self.model)
            .system(system)
            .message(Message::user(&request.prompt))
            .temperature(0.0)
            .max_tokens(request.max_tokens);

        if request.json {
            messages = messages.message(Message::assistant("{"));
        }
        messages
    }
}

#[async_trait]
impl AI for Anthropic {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let mut attempt = 0;

        let response = loop {
            match self.client.messages(self.build_request(request)).await {
                Ok(response) => break response,
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        task = request.task.as_str(),
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Retrying model call"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(CompareError::Ai(Box::new(e))),
            }
        };

        if response.is_truncated() {
            warn!(
                task = request.task.as_str(),
                max_tokens = request.max_tokens,
                "Model output truncated"
            );
        }
        debug!(
            task = request.task.as_str(),
            chars = response.content.len(),
            "Model call complete"
        );

        if request.json {
            Ok(format!("{{{}", response.content))
        } else {
            Ok(response.content)
        }
    }
}
