//! Attribute extraction - document text to raw attribute sets.
//!
//! Two modes share one response parser:
//!
//! - **Per-document**: one model call per document, at most
//!   `concurrency` calls in flight.
//! - **Batched**: all documents in one call. A batch whose call fails or
//!   whose reply cannot be parsed is split in halves and each half is
//!   retried, up to `max_split_depth` rounds. Halves of the same round
//!   run concurrently. Documents still failing
//!   after that are marked failed individually.
//!
//! Output is always one result per input document, in input order.

use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::pipeline::prompts::{
    extraction_schema, format_extract_batch_prompt, format_extract_prompt, EXTRACT_SYSTEM_PROMPT,
};
use crate::pipeline::repair::{parse_json_lenient, value_to_string};
use crate::traits::ai::{AiTask, GenerateRequest, AI};
use crate::types::attributes::RawAttributeSet;
use crate::types::config::{ExtractConfig, ExtractMode};

/// A normalized document ready for extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub url: &'a str,
    pub text: &'a str,
}

impl<'a> ExtractionInput<'a> {
    pub fn new(url: &'a str, text: &'a str) -> Self {
        Self { url, text }
    }
}

/// Per-document extraction outcome.
pub type ExtractOutcome = Result<RawAttributeSet, ExtractError>;

/// Result of one batch call: settled documents and halves to retry.
struct BatchStep {
    done: Vec<(usize, ExtractOutcome)>,
    retry: Vec<Vec<usize>>,
}

impl BatchStep {
    fn settled(done: Vec<(usize, ExtractOutcome)>) -> Self {
        Self {
            done,
            retry: Vec::new(),
        }
    }
}

/// Extracts raw attributes using a generative capability.
pub struct AttributeExtractor<'a, A: AI> {
    ai: &'a A,
    config: &'a ExtractConfig,
}

impl<'a, A: AI> AttributeExtractor<'a, A> {
    pub fn new(ai: &'a A, config: &'a ExtractConfig) -> Self {
        Self { ai, config }
    }

    /// Extract every document using the configured mode.
    pub async fn extract_all(&self, docs: &[ExtractionInput<'_>]) -> Vec<ExtractOutcome> {
        let results = match self.config.mode {
            ExtractMode::PerDocument => self.extract_each(docs).await,
            ExtractMode::Batched => self.extract_batched(docs).await,
        };

        let ok = results.iter().filter(|r| r.is_ok()).count();
        info!(
            mode = ?self.config.mode,
            documents = docs.len(),
            ok,
            failed = docs.len() - ok,
            "Extraction complete"
        );

        results
    }

    /// Extract a single document with its own model call.
    pub async fn extract_one(&self, doc: ExtractionInput<'_>) -> ExtractOutcome {
        let request = GenerateRequest::new(
            AiTask::ExtractAttributes,
            EXTRACT_SYSTEM_PROMPT,
            format_extract_prompt(doc.text, self.config.category_hint.as_deref()),
        )
        .with_schema(extraction_schema())
        .with_max_tokens(self.config.max_tokens);

        let response = self
            .ai
            .generate(&request)
            .await
            .map_err(|e| ExtractError::Ai(e.to_string()))?;

        let value =
            parse_json_lenient(&response).map_err(|e| ExtractError::Unparseable(e.to_string()))?;

        let result = parse_attribute_object(&value, doc.url);
        if let Err(e) = &result {
            debug!(url = %doc.url, error = %e, "Extraction produced no attributes");
        }
        result
    }

    async fn extract_each(&self, docs: &[ExtractionInput<'_>]) -> Vec<ExtractOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let tasks = docs.iter().map(|doc| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await;
                self.extract_one(*doc).await
            }
        });

        join_all(tasks).await
    }

    async fn extract_batched(&self, docs: &[ExtractionInput<'_>]) -> Vec<ExtractOutcome> {
        if docs.len() <= 1 {
            return self.extract_each(docs).await;
        }

        let mut results: Vec<Option<ExtractOutcome>> = vec![None; docs.len()];
        let mut level: Vec<Vec<usize>> = vec![(0..docs.len()).collect()];
        let mut depth = 0;

        // Batches of one split level run concurrently.
        while !level.is_empty() {
            let steps = join_all(level.iter().map(|batch| self.run_batch(docs, batch, depth))).await;

            let mut next = Vec::new();
            for step in steps {
                for (idx, outcome) in step.done {
                    results[idx] = Some(outcome);
                }
                next.extend(step.retry);
            }
            level = next;
            depth += 1;
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(ExtractError::Unparseable("not processed".into()))))
            .collect()
    }

    /// Run one batch, either settling its documents or splitting it.
    async fn run_batch(
        &self,
        docs: &[ExtractionInput<'_>],
        batch: &[usize],
        depth: usize,
    ) -> BatchStep {
        if let [idx] = batch {
            return BatchStep::settled(vec![(*idx, self.extract_one(docs[*idx]).await)]);
        }

        match self.call_batch(docs, batch).await {
            Ok(mut items) => BatchStep::settled(
                batch
                    .iter()
                    .enumerate()
                    .map(|(pos, &idx)| {
                        let number = pos + 1;
                        let outcome = match items.remove(&number) {
                            Some(item) => parse_attribute_object(&item, docs[idx].url),
                            None => Err(ExtractError::MissingFromBatch { index: number }),
                        };
                        (idx, outcome)
                    })
                    .collect(),
            ),
            Err(e) if depth < self.config.max_split_depth => {
                warn!(
                    batch_size = batch.len(),
                    depth,
                    error = %e,
                    "Batch failed, splitting"
                );
                let (left, right) = batch.split_at(batch.len() / 2);
                BatchStep {
                    done: Vec::new(),
                    retry: vec![left.to_vec(), right.to_vec()],
                }
            }
            Err(e) => {
                warn!(batch_size = batch.len(), depth, error = %e, "Batch failed at split limit");
                BatchStep::settled(batch.iter().map(|&idx| (idx, Err(e.clone()))).collect())
            }
        }
    }

    /// One model call for a batch; returns items keyed by 1-based number.
    async fn call_batch(
        &self,
        docs: &[ExtractionInput<'_>],
        batch: &[usize],
    ) -> Result<HashMap<usize, Value>, ExtractError> {
        let texts: Vec<&str> = batch.iter().map(|&i| docs[i].text).collect();
        let per_doc = self.config.per_document_budget(texts.len());

        let request = GenerateRequest::new(
            AiTask::ExtractBatch,
            EXTRACT_SYSTEM_PROMPT,
            format_extract_batch_prompt(&texts, per_doc, self.config.category_hint.as_deref()),
        )
        .json()
        .with_max_tokens(self.config.max_tokens);

        debug!(batch_size = batch.len(), per_doc_chars = per_doc, "Batch extraction call");

        let response = self
            .ai
            .generate(&request)
            .await
            .map_err(|e| ExtractError::Ai(e.to_string()))?;

        let value =
            parse_json_lenient(&response).map_err(|e| ExtractError::Unparseable(e.to_string()))?;

        let items = parse_batch_items(&value);
        if items.is_empty() {
            return Err(ExtractError::Unparseable("batch reply has no items".into()));
        }
        Ok(items)
    }
}

/// Items of a batch reply keyed by their 1-based document number.
///
/// Accepts `{"items": [...]}` or a bare array; items without a usable
/// `index` are ignored.
pub fn parse_batch_items(value: &Value) -> HashMap<usize, Value> {
    let items: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("items").or_else(|| map.get("products")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| {
            let index = item.get("index").or_else(|| item.get("pdf_index"))?;
            let index = match index {
                Value::Number(n) => n.as_u64()? as usize,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            Some((index, item.clone()))
        })
        .collect()
}

/// Validate one extraction object into a [`RawAttributeSet`].
///
/// Accepts the canonical field names and the common aliases models fall
/// back to (`manufacturer`, `product_name`, `specifications`, ...).
pub fn parse_attribute_object(value: &Value, url: &str) -> ExtractOutcome {
    let object = value
        .as_object()
        .ok_or_else(|| ExtractError::Unparseable("expected a JSON object".into()))?;

    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| object.get(*n))
            .and_then(value_to_string)
    };

    let mut set = RawAttributeSet::new(url);
    set.entity_name = field(&["entity_name", "manufacturer", "supplier", "company"]);
    set.item_identifier = field(&["item_identifier", "product_name", "model", "part_number"]);

    let attributes = ["attributes", "specifications", "specs"]
        .iter()
        .find_map(|n| object.get(*n).and_then(Value::as_object));

    if let Some(attributes) = attributes {
        for (key, value) in attributes {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            if let Some(value) = value_to_string(value) {
                set.attributes.insert(key.to_string(), value);
            }
        }
    }

    if set.is_empty() {
        return Err(ExtractError::NoAttributes);
    }
    Ok(set)
}
