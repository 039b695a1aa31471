//! Result assembly - turn the selection into table rows.

use indexmap::IndexMap;

use crate::pipeline::select::Selection;
use crate::types::attributes::RawAttributeSet;
use crate::types::mapping::CanonicalKeyMapping;
use crate::types::record::{Column, ComparableRecord, RecordStatus, NOT_AVAILABLE};

/// Columns for the selected keys, with coverage counted over kept sources.
pub fn build_columns(mapping: &CanonicalKeyMapping, selection: &Selection) -> Vec<Column> {
    selection
        .keys
        .iter()
        .filter_map(|key| mapping.get(key))
        .map(|canonical| Column {
            key: canonical.key.clone(),
            display_name: canonical.display_name.clone(),
            coverage: selection
                .kept
                .iter()
                .filter(|&&s| canonical.sources.contains_key(&s))
                .count(),
        })
        .collect()
}

/// One record per kept source, values looked up through the mapping.
///
/// Every record has exactly the selected keys, in column order; a key a
/// source does not have reads [`NOT_AVAILABLE`].
pub fn assemble_records(
    sets: &[RawAttributeSet],
    mapping: &CanonicalKeyMapping,
    selection: &Selection,
) -> Vec<ComparableRecord> {
    selection
        .kept
        .iter()
        .filter_map(|&source| sets.get(source).map(|set| (source, set)))
        .map(|(source, set)| {
            let specs = selection
                .keys
                .iter()
                .map(|key| {
                    let value = mapping
                        .original_key(key, source)
                        .and_then(|original| set.get(original))
                        .unwrap_or(NOT_AVAILABLE);
                    (key.clone(), value.to_string())
                })
                .collect();

            ComparableRecord {
                url: set.source_url.clone(),
                entity_name: set.entity_name.clone(),
                item_identifier: set.item_identifier.clone(),
                specs,
                contact_url: None,
                status: RecordStatus::Ok,
                error: None,
            }
        })
        .collect()
}

/// A record carrying a source's raw attributes, for uncompared responses.
pub fn raw_record(set: &RawAttributeSet) -> ComparableRecord {
    let specs: IndexMap<String, String> = set
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    ComparableRecord {
        url: set.source_url.clone(),
        entity_name: set.entity_name.clone(),
        item_identifier: set.item_identifier.clone(),
        specs,
        contact_url: None,
        status: RecordStatus::Ok,
        error: None,
    }
}
