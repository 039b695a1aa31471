//! Lenient JSON parsing for model output.
//!
//! Models wrap JSON in prose or code fences, leave trailing commas and
//! emit adjacent objects without a separator. Parsing tries the text as
//! is, then once more after repair; the result is always either a valid
//! value or the parse error.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

static ADJACENT_OBJECTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}(\s*)\{").expect("valid adjacent object regex"));

static ADJACENT_ARRAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\](\s*)\[").expect("valid adjacent array regex"));

/// Parse model output as JSON, repairing common defects if needed.
pub fn parse_json_lenient(text: &str) -> serde_json::Result<Value> {
    let trimmed = text.trim();
    let original_error = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match repair_json(trimmed) {
        Some(repaired) => serde_json::from_str(&repaired),
        None => Err(original_error),
    }
}

/// Best-effort textual repair. Returns `None` when no JSON body is found.
pub fn repair_json(text: &str) -> Option<String> {
    let start = text.find(&['{', '['][..])?;
    let end = text.rfind(&['}', ']'][..])?;
    if end < start {
        return None;
    }

    let body = &text[start..=end];
    let body = TRAILING_COMMA.replace_all(body, "$1");
    let body = ADJACENT_OBJECTS.replace_all(&body, "},$1{");
    let body = ADJACENT_ARRAYS.replace_all(&body, "],$1[");

    Some(body.into_owned())
}

/// Render a JSON scalar as an attribute value.
///
/// Strings are trimmed, numbers and booleans printed, arrays joined with
/// ", ". Null, empty strings and objects yield `None`.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_string).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}
