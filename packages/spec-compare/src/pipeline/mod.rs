//! Comparison pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Discovery (search + candidate filtering)
//! - Acquisition with per-source timeouts
//! - Normalization to bounded markdown
//! - Attribute extraction (per-document or batched)
//! - Key normalization with verification
//! - Coverage selection and mutual-overlap pruning
//! - Assembly and contact resolution

pub mod acquire;
pub mod assemble;
pub mod compare;
pub mod contact;
pub mod discover;
pub mod extract;
pub mod keys;
pub mod normalize;
pub mod prompts;
pub mod repair;
pub mod select;

pub use acquire::{find_pdf_links, Acquirer};
pub use assemble::{assemble_records, build_columns, raw_record};
pub use compare::{CompareRequest, Comparator};
pub use contact::{derive_contact_url, homepage_url, ContactResolver};
pub use discover::{accepts, build_search_query, Discoverer};
pub use extract::{
    parse_attribute_object, parse_batch_items, AttributeExtractor, ExtractOutcome,
    ExtractionInput,
};
pub use keys::{fallback_mapping, parse_grouping, to_snake_case, KeyNormalizer};
pub use normalize::{truncate_chars, ContentNormalizer};
pub use prompts::{
    extraction_schema, format_extract_batch_prompt, format_extract_prompt,
    format_group_keys_prompt, EXTRACT_ATTRIBUTES_PROMPT, EXTRACT_BATCH_PROMPT, GROUP_KEYS_PROMPT,
};
pub use repair::{parse_json_lenient, repair_json, value_to_string};
pub use select::{shared_keys, CoverageSelector, Selection};
