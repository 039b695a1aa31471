//! Raw attribute sets - what extraction produces for one document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attributes extracted from a single document, in the document's own
/// vocabulary.
///
/// Keys are whatever the model used ("Supply Voltage", "vcc", ...);
/// reconciling them across documents is the key normalizer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAttributeSet {
    /// Source URL the attributes were read from
    pub source_url: String,

    /// Manufacturer or supplier name
    #[serde(default)]
    pub entity_name: Option<String>,

    /// Part number, product name or service line
    #[serde(default)]
    pub item_identifier: Option<String>,

    /// Attribute name to value, in extraction order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl RawAttributeSet {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            entity_name: None,
            item_identifier: None,
            attributes: IndexMap::new(),
        }
    }

    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    pub fn with_item_identifier(mut self, id: impl Into<String>) -> Self {
        self.item_identifier = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Resolve a key name the way it actually appears in this set.
    ///
    /// Exact match first, then case-insensitive (trimmed). Returns the
    /// stored spelling so later lookups with [`Self::get`] succeed.
    pub fn find_key(&self, key: &str) -> Option<&str> {
        if let Some((stored, _)) = self.attributes.get_key_value(key) {
            return Some(stored.as_str());
        }

        let wanted = key.trim().to_lowercase();
        self.attributes
            .keys()
            .find(|k| k.trim().to_lowercase() == wanted)
            .map(String::as_str)
    }
}
