//! Key normalization - reconcile attribute names across sources.
//!
//! The model only proposes groups. Every (source, name) pair it reports is
//! checked against that source's real keys before it enters the mapping,
//! so the mapping never points at a key a source does not have.
//!
//! # Fallback
//!
//! When the grouping call fails, cannot be parsed, or yields nothing
//! verifiable, the first source's raw keys become the column vocabulary,
//! matched case-insensitively against the other sources.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::pipeline::prompts::{format_group_keys_prompt, GROUP_KEYS_SYSTEM_PROMPT};
use crate::pipeline::repair::parse_json_lenient;
use crate::traits::ai::{AiTask, GenerateRequest, AI};
use crate::types::attributes::RawAttributeSet;
use crate::types::config::KeyNormalizerConfig;
use crate::types::mapping::{CanonicalKey, CanonicalKeyMapping};

/// Builds a [`CanonicalKeyMapping`] over extracted attribute sets.
pub struct KeyNormalizer<'a, A: AI> {
    ai: &'a A,
    config: &'a KeyNormalizerConfig,
}

impl<'a, A: AI> KeyNormalizer<'a, A> {
    pub fn new(ai: &'a A, config: &'a KeyNormalizerConfig) -> Self {
        Self { ai, config }
    }

    /// Group attribute names across `sets`. Never fails; see the module
    /// docs for the fallback.
    pub async fn normalize_keys(&self, sets: &[RawAttributeSet]) -> CanonicalKeyMapping {
        if sets.is_empty() {
            return CanonicalKeyMapping::new(0);
        }

        let source_keys: Vec<Vec<&str>> = sets.iter().map(|s| s.keys().collect()).collect();
        let request = GenerateRequest::new(
            AiTask::GroupKeys,
            GROUP_KEYS_SYSTEM_PROMPT,
            format_group_keys_prompt(&source_keys),
        )
        .json()
        .with_max_tokens(self.config.max_tokens);

        let value = match self.ai.generate(&request).await {
            Ok(text) => parse_json_lenient(&text).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let mapping = match value {
            Ok(value) => parse_grouping(&value, sets, self.config.min_coverage),
            Err(e) => {
                warn!(error = %e, "Key grouping failed, using first source's keys");
                return fallback_mapping(sets, self.config.min_coverage);
            }
        };

        if mapping.is_empty() {
            warn!(
                sources = sets.len(),
                "Key grouping produced no verified groups, using first source's keys"
            );
            return fallback_mapping(sets, self.config.min_coverage);
        }

        info!(
            sources = sets.len(),
            canonical_keys = mapping.len(),
            "Key normalization complete"
        );
        mapping
    }
}

/// Turn a grouping reply into a verified mapping.
///
/// Source indices in the reply are 1-based. Mappings to unknown sources
/// or to names a source does not contain are dropped, each (source, name)
/// pair belongs to the first group claiming it, and groups left with
/// fewer than `min_coverage` sources are discarded.
pub fn parse_grouping(
    value: &Value,
    sets: &[RawAttributeSet],
    min_coverage: usize,
) -> CanonicalKeyMapping {
    let mut mapping = CanonicalKeyMapping::new(sets.len());

    let Some(groups) = group_object(value) else {
        return mapping;
    };

    let mut claimed: HashSet<(usize, String)> = HashSet::new();
    let mut dropped = 0usize;

    for (raw_key, group) in groups {
        let display_name = group
            .get("display_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(raw_key.as_str());

        let key = match to_snake_case(raw_key) {
            k if !k.is_empty() => k,
            _ => to_snake_case(display_name),
        };
        if key.is_empty() {
            continue;
        }

        let Some(sources) = group
            .get("sources")
            .or_else(|| group.get("pdf_matches"))
            .and_then(Value::as_object)
        else {
            continue;
        };

        let existing = mapping.keys.iter().position(|k| k.key == key);
        let mut canonical = CanonicalKey::new(&key, display_name);
        for (index, names) in sources {
            let Some(source) = parse_source_index(index).filter(|&i| i < sets.len()) else {
                dropped += 1;
                continue;
            };

            let verified = candidate_names(names)
                .into_iter()
                .find_map(|name| sets[source].find_key(name));

            match verified {
                Some(stored) => {
                    let filled = canonical.sources.contains_key(&source)
                        || existing.is_some_and(|i| mapping.keys[i].sources.contains_key(&source));
                    if !filled && claimed.insert((source, stored.to_string())) {
                        canonical.sources.insert(source, stored.to_string());
                    }
                }
                None => dropped += 1,
            }
        }

        match existing {
            Some(i) => mapping.keys[i].sources.extend(canonical.sources),
            None => mapping.keys.push(canonical),
        }
    }

    let before = mapping.keys.len();
    mapping.keys.retain(|k| k.coverage() >= min_coverage);

    debug!(
        groups = before,
        kept = mapping.keys.len(),
        unverified_mappings = dropped,
        "Grouping verified"
    );

    mapping
}

/// Columns from the first source's keys, matched case-insensitively.
///
/// Keys found in fewer than `min_coverage` sources are dropped unless
/// that would leave nothing, in which case every key of the first source
/// is kept.
pub fn fallback_mapping(sets: &[RawAttributeSet], min_coverage: usize) -> CanonicalKeyMapping {
    let mut mapping = CanonicalKeyMapping::new(sets.len());
    mapping.fallback = true;

    let Some(first) = sets.first() else {
        return mapping;
    };

    for original in first.keys() {
        let key = to_snake_case(original);
        if key.is_empty() || mapping.get(&key).is_some() {
            continue;
        }

        let mut canonical = CanonicalKey::new(key, original);
        for (i, set) in sets.iter().enumerate() {
            if let Some(stored) = set.find_key(original) {
                canonical.sources.insert(i, stored.to_string());
            }
        }
        mapping.keys.push(canonical);
    }

    if mapping.keys.iter().any(|k| k.coverage() >= min_coverage) {
        mapping.keys.retain(|k| k.coverage() >= min_coverage);
    }

    mapping
}

/// `"Max. Operating Pressure (bar)"` -> `"max_operating_pressure_bar"`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// The map of groups, unwrapping a single `groups`-style envelope.
fn group_object(value: &Value) -> Option<&Map<String, Value>> {
    let object = value.as_object()?;
    if object.len() == 1 {
        let inner = ["groups", "canonical_keys", "mapping"]
            .iter()
            .find_map(|envelope| object.get(*envelope).and_then(Value::as_object));
        if let Some(inner) = inner {
            return Some(inner);
        }
    }
    Some(object)
}

/// `"2"`, `" 2 "` or `"source 2"` -> `Some(1)`.
fn parse_source_index(raw: &str) -> Option<usize> {
    let digits = raw.trim().trim_start_matches(|c: char| !c.is_ascii_digit());
    let n: usize = digits.parse().ok()?;
    n.checked_sub(1)
}

fn candidate_names(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
