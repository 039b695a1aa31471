//! Canonical key mapping - the cross-document vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One canonical attribute and the per-source keys it was matched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalKey {
    /// Stable identifier (snake_case)
    pub key: String,

    /// Human-readable column label
    pub display_name: String,

    /// Source position (0-based) to the key as spelled in that source
    pub sources: BTreeMap<usize, String>,
}

impl CanonicalKey {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            sources: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, index: usize, original: impl Into<String>) -> Self {
        self.sources.insert(index, original.into());
        self
    }

    /// Number of sources containing this key.
    pub fn coverage(&self) -> usize {
        self.sources.len()
    }
}

/// Canonical keys over a fixed list of attribute sets.
///
/// Built once per request; every source mapping has been verified to
/// exist in its attribute set, so coverage never exceeds `source_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalKeyMapping {
    /// Canonical keys in the order the normalizer produced them
    pub keys: Vec<CanonicalKey>,

    /// Number of attribute sets the mapping was built over
    pub source_count: usize,

    /// True when the generative grouping failed and keys were taken
    /// from the first document
    pub fallback: bool,
}

impl CanonicalKeyMapping {
    pub fn new(source_count: usize) -> Self {
        Self {
            keys: Vec::new(),
            source_count,
            fallback: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CanonicalKey> {
        self.keys.iter().find(|k| k.key == key)
    }

    pub fn coverage(&self, key: &str) -> usize {
        self.get(key).map(CanonicalKey::coverage).unwrap_or(0)
    }

    /// The key as spelled in one source, if that source has it.
    pub fn original_key(&self, key: &str, source: usize) -> Option<&str> {
        self.get(key)
            .and_then(|k| k.sources.get(&source))
            .map(String::as_str)
    }

    /// Canonical keys present in one source.
    pub fn keys_for_source(&self, source: usize) -> BTreeSet<&str> {
        self.keys
            .iter()
            .filter(|k| k.sources.contains_key(&source))
            .map(|k| k.key.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> CanonicalKeyMapping {
        CanonicalKeyMapping {
            keys: vec![
                CanonicalKey::new("voltage", "Voltage")
                    .with_source(0, "Supply Voltage")
                    .with_source(1, "VCC"),
                CanonicalKey::new("weight", "Weight").with_source(1, "Mass"),
            ],
            source_count: 2,
            fallback: false,
        }
    }

    #[test]
    fn test_coverage_and_lookup() {
        let m = mapping();
        assert_eq!(m.coverage("voltage"), 2);
        assert_eq!(m.coverage("missing"), 0);
        assert_eq!(m.original_key("voltage", 1), Some("VCC"));
        assert_eq!(m.original_key("weight", 0), None);
    }

    #[test]
    fn test_keys_for_source() {
        let m = mapping();
        assert_eq!(m.keys_for_source(0).into_iter().collect::<Vec<_>>(), vec!["voltage"]);
        assert_eq!(m.keys_for_source(1).len(), 2);
    }
}
