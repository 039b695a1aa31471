//! LLM prompts for the comparison pipeline.
//!
//! Templates use `{placeholder}` substitution; the `format_*` functions
//! fill them in.

use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

/// System instruction shared by every extraction call.
pub const EXTRACT_SYSTEM_PROMPT: &str = "You extract technical specifications from product \
documents. You answer with a single JSON object and nothing else.";

/// System instruction for key grouping.
pub const GROUP_KEYS_SYSTEM_PROMPT: &str = "You reconcile specification names used by \
different manufacturers. You answer with a single JSON object and nothing else.";

/// Prompt for extracting attributes from one document.
pub const EXTRACT_ATTRIBUTES_PROMPT: &str = r#"{category_section}Read the document below and list every technical specification it states.

Cover:
- Electrical ratings (voltage, current, power, signal types)
- Physical properties (dimensions, weight, materials, mounting)
- Performance figures (accuracy, range, speed, capacity, tolerances)
- Environmental limits (temperature, humidity, ingress protection)
- For service providers: processes, materials handled, certifications, lead times

Also identify who makes or offers it and the part number, model or service line.

Rules:
- Read markdown tables row by row; each parameter row is one specification.
- Keep the document's own wording for specification names.
- Put units in the value ("24 VDC", "-40 to 85 °C", "1.2 kg").
- Skip ordering codes, revision history and legal text.

Document:
{document}

Output JSON:
{
    "entity_name": "manufacturer or supplier",
    "item_identifier": "part number, model or service line",
    "attributes": {
        "Specification Name": "value with units"
    }
}"#;

/// Prompt for extracting attributes from several documents in one call.
pub const EXTRACT_BATCH_PROMPT: &str = r#"{category_section}Below are {count} documents, each starting with a "--- DOCUMENT n ---" marker. Extract the technical specifications of each one separately.

Rules:
- Never mix values between documents.
- Keep each document's own wording for specification names.
- Put units in the value ("24 VDC", "-40 to 85 °C", "1.2 kg").
- Skip ordering codes, revision history and legal text.
- Return one item per document, using the document's number as "index".

{documents}

Output JSON:
{
    "items": [
        {
            "index": 1,
            "entity_name": "manufacturer or supplier",
            "item_identifier": "part number, model or service line",
            "attributes": {
                "Specification Name": "value with units"
            }
        }
    ]
}"#;

/// Prompt for grouping attribute names across sources.
pub const GROUP_KEYS_PROMPT: &str = r#"Several sources describe products of the same category, each naming its specifications differently. Group the names that refer to the same measurable property.

Group by the property, not the wording: "Supply Voltage", "Vcc" and "Operating Voltage" are one group; "Max Pressure" and "Pressure Rating" are one group. Qualifiers such as max, nominal or rated do not split a group.

Specification names per source:
{source_keys}

Rules:
1. Give each group a snake_case key and a readable display_name.
2. Under "sources", map the source number to the name exactly as listed for that source.
3. Only keep groups that at least two sources share.
4. Skip non-technical names (document numbers, dates, ordering info).

Output JSON:
{
    "canonical_key": {
        "display_name": "Readable Name",
        "sources": {
            "1": "Name as listed in source 1",
            "3": "Name as listed in source 3"
        }
    }
}"#;

/// Shape of a single-document extraction reply, used for the JSON schema.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AttributeExtractionSchema {
    /// Manufacturer or supplier
    pub entity_name: String,

    /// Part number, model or service line
    pub item_identifier: String,

    /// Specification name to value with units
    pub attributes: BTreeMap<String, String>,
}

/// JSON schema for single-document extraction replies.
pub fn extraction_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(AttributeExtractionSchema))
        .unwrap_or(serde_json::Value::Null)
}

fn category_section(category: Option<&str>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => format!("Product category: {}\n\n", c.trim()),
        _ => String::new(),
    }
}

/// Format the single-document extraction prompt.
pub fn format_extract_prompt(document: &str, category: Option<&str>) -> String {
    EXTRACT_ATTRIBUTES_PROMPT
        .replace("{category_section}", &category_section(category))
        .replace("{document}", document)
}

/// Format the batched extraction prompt.
///
/// Documents are numbered from 1 and each is cut to `per_document_chars`.
pub fn format_extract_batch_prompt(
    documents: &[&str],
    per_document_chars: usize,
    category: Option<&str>,
) -> String {
    let blocks = documents
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let text = crate::pipeline::normalize::truncate_chars(text, per_document_chars);
            format!("--- DOCUMENT {} ---\n{}\n", i + 1, text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    EXTRACT_BATCH_PROMPT
        .replace("{category_section}", &category_section(category))
        .replace("{count}", &documents.len().to_string())
        .replace("{documents}", &blocks)
}

/// Format the key grouping prompt.
///
/// Sources are numbered from 1.
pub fn format_group_keys_prompt(source_keys: &[Vec<&str>]) -> String {
    let listing = source_keys
        .iter()
        .enumerate()
        .map(|(i, keys)| {
            let quoted = keys
                .iter()
                .map(|k| format!("\"{}\"", k.replace('"', "'")))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Source {}: [{}]", i + 1, quoted)
        })
        .collect::<Vec<_>>()
        .join("\n");

    GROUP_KEYS_PROMPT.replace("{source_keys}", &listing)
}
