//! Coverage selection - pick the columns and the rows worth showing.
//!
//! Columns are the highest-coverage canonical keys. Rows are then pruned
//! until every pair of remaining sources shares enough of those columns;
//! a source that is "N/A" almost everywhere is dropped rather than shown.
//!
//! Selection is a pure function of the mapping and the config, so the
//! same input always yields the same columns and rows.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::types::config::SelectorConfig;
use crate::types::mapping::CanonicalKeyMapping;

/// The outcome of coverage selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selected canonical keys, in column order
    pub keys: Vec<String>,

    /// Source positions kept, ascending
    pub kept: Vec<usize>,

    /// Source positions removed for low overlap, in removal order
    pub pruned: Vec<usize>,

    /// Pruning could not reach the overlap minimum, so every source was kept
    pub keep_everyone: bool,

    /// Shared-column minimum that was enforced
    pub required_overlap: usize,
}

/// Ranks canonical keys and prunes sources with too little overlap.
pub struct CoverageSelector<'a> {
    config: &'a SelectorConfig,
}

impl<'a> CoverageSelector<'a> {
    pub fn new(config: &'a SelectorConfig) -> Self {
        Self { config }
    }

    /// Select columns, then prune sources against them.
    pub fn select(&self, mapping: &CanonicalKeyMapping) -> Selection {
        let keys = self.select_keys(mapping);
        let selection = self.prune(mapping, keys);

        info!(
            columns = selection.keys.len(),
            kept = selection.kept.len(),
            pruned = selection.pruned.len(),
            keep_everyone = selection.keep_everyone,
            "Coverage selection complete"
        );

        selection
    }

    /// The top `target_count` keys by coverage, ties in mapping order.
    ///
    /// Keys must reach the coverage floor; when none do, the floor drops
    /// to the absolute minimum, and when none reach that either (a
    /// single-source fallback mapping) any key is taken.
    pub fn select_keys(&self, mapping: &CanonicalKeyMapping) -> Vec<String> {
        let mut ranked: Vec<_> = mapping.keys.iter().collect();
        ranked.sort_by(|a, b| b.coverage().cmp(&a.coverage()));

        let take = |floor: usize| -> Vec<String> {
            ranked
                .iter()
                .filter(|k| k.coverage() >= floor)
                .take(self.config.target_count)
                .map(|k| k.key.clone())
                .collect()
        };

        let floor = self.config.coverage_floor(mapping.source_count);
        let mut keys = take(floor);
        if keys.is_empty() && floor > self.config.min_coverage {
            debug!(floor, relaxed = self.config.min_coverage, "Relaxing coverage floor");
            keys = take(self.config.min_coverage);
        }
        if keys.is_empty() {
            keys = take(1);
        }
        keys
    }

    /// Iteratively remove the source with the worst pairwise overlap.
    ///
    /// Runs at most `source_count` rounds. Stops once every remaining pair
    /// shares `required_overlap` selected keys; if that needs fewer than
    /// `min_sources` sources, nobody is pruned.
    pub fn prune(&self, mapping: &CanonicalKeyMapping, keys: Vec<String>) -> Selection {
        let n = mapping.source_count;
        let required = self.config.min_common_attributes.min(keys.len());

        let selected: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
        let per_source: Vec<BTreeSet<&str>> = (0..n)
            .map(|i| {
                mapping
                    .keys_for_source(i)
                    .into_iter()
                    .filter(|k| selected.contains(k))
                    .collect()
            })
            .collect();
        let overlap = |a: usize, b: usize| per_source[a].intersection(&per_source[b]).count();

        let mut alive: Vec<usize> = (0..n).collect();
        let mut pruned = Vec::new();
        let mut satisfied = false;

        for _ in 0..=n {
            let worst: Vec<(usize, usize)> = alive
                .iter()
                .map(|&a| {
                    let min = alive
                        .iter()
                        .filter(|&&b| b != a)
                        .map(|&b| overlap(a, b))
                        .min()
                        .unwrap_or(usize::MAX);
                    (a, min)
                })
                .collect();

            if worst.iter().all(|&(_, min)| min >= required) {
                satisfied = true;
                break;
            }
            if alive.len() <= self.config.min_sources {
                break;
            }

            // Lowest worst-pair overlap; ties go to the later source.
            let Some(&(victim, min)) = worst
                .iter()
                .reduce(|best, cur| if cur.1 <= best.1 { cur } else { best })
            else {
                break;
            };

            debug!(source = victim, worst_overlap = min, required, "Pruning source");
            alive.retain(|&s| s != victim);
            pruned.push(victim);
        }

        if !satisfied {
            warn!(
                sources = n,
                required,
                "Sources never reached the shared-column minimum, keeping everyone"
            );
            return Selection {
                keys,
                kept: (0..n).collect(),
                pruned: Vec::new(),
                keep_everyone: true,
                required_overlap: required,
            };
        }

        Selection {
            keys,
            kept: alive,
            pruned,
            keep_everyone: false,
            required_overlap: required,
        }
    }
}

/// Number of selected keys two sources share.
pub fn shared_keys(mapping: &CanonicalKeyMapping, keys: &[String], a: usize, b: usize) -> usize {
    keys.iter()
        .filter(|k| {
            mapping.original_key(k, a).is_some() && mapping.original_key(k, b).is_some()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mapping::CanonicalKey;

    /// Build a mapping from `(key, sources)` pairs.
    fn mapping(n: usize, groups: &[(&str, &[usize])]) -> CanonicalKeyMapping {
        let mut mapping = CanonicalKeyMapping::new(n);
        for (key, sources) in groups {
            let mut canonical = CanonicalKey::new(*key, *key);
            for &s in *sources {
                canonical = canonical.with_source(s, format!("{} {}", key, s));
            }
            mapping.keys.push(canonical);
        }
        mapping
    }

    #[test]
    fn test_scenario_three_sources() {
        let m = mapping(
            3,
            &[
                ("d", &[0, 1]),
                ("a", &[0, 1, 2]),
                ("b", &[0, 1, 2]),
                ("e", &[1, 2]),
                ("c", &[0, 1, 2]),
            ],
        );
        let config = SelectorConfig::default();
        let selection = CoverageSelector::new(&config).select(&m);

        assert_eq!(selection.keys, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(selection.kept, vec![0, 1, 2]);
        assert!(!selection.keep_everyone);
    }

    #[test]
    fn test_floor_scales_with_sources() {
        // 6 sources: floor is 3
        let m = mapping(6, &[("x", &[0, 1]), ("y", &[0, 1, 2]), ("z", &[0, 1, 2, 3])]);
        let config = SelectorConfig::default();
        let keys = CoverageSelector::new(&config).select_keys(&m);
        assert_eq!(keys, vec!["z", "y"]);
    }

    #[test]
    fn test_floor_relaxes_when_nothing_qualifies() {
        let m = mapping(6, &[("x", &[0, 1]), ("y", &[2, 3])]);
        let config = SelectorConfig::default();
        let keys = CoverageSelector::new(&config).select_keys(&m);
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_target_count_respected() {
        let groups: Vec<(String, Vec<usize>)> =
            (0..8).map(|i| (format!("k{}", i), vec![0, 1])).collect();
        let refs: Vec<(&str, &[usize])> =
            groups.iter().map(|(k, s)| (k.as_str(), s.as_slice())).collect();
        let m = mapping(2, &refs);

        let config = SelectorConfig {
            target_count: 3,
            ..Default::default()
        };
        assert_eq!(CoverageSelector::new(&config).select_keys(&m), vec!["k0", "k1", "k2"]);
    }

    #[test]
    fn test_prunes_sparse_source() {
        // Source 3 only shares one column with the others.
        let m = mapping(
            4,
            &[
                ("a", &[0, 1, 2, 3]),
                ("b", &[0, 1, 2]),
                ("c", &[0, 1, 2]),
                ("d", &[0, 1, 2]),
            ],
        );
        let config = SelectorConfig::default();
        let selection = CoverageSelector::new(&config).select(&m);

        assert_eq!(selection.kept, vec![0, 1, 2]);
        assert_eq!(selection.pruned, vec![3]);
        for &a in &selection.kept {
            for &b in &selection.kept {
                if a != b {
                    assert!(shared_keys(&m, &selection.keys, a, b) >= 3);
                }
            }
        }
    }

    #[test]
    fn test_ties_prune_later_source() {
        // Sources 0 and 1 share everything; 2 and 3 are equally poor.
        let m = mapping(
            4,
            &[
                ("a", &[0, 1, 2, 3]),
                ("b", &[0, 1, 2]),
                ("c", &[0, 1, 3]),
                ("d", &[0, 1]),
            ],
        );
        let config = SelectorConfig::default();
        let selection = CoverageSelector::new(&config).select(&m);

        assert_eq!(selection.pruned.first(), Some(&3));
    }

    #[test]
    fn test_keep_everyone_floor() {
        let m = mapping(
            3,
            &[
                ("a", &[0, 1]),
                ("b", &[1, 2]),
                ("c", &[0, 2]),
            ],
        );
        let config = SelectorConfig::default();
        let selection = CoverageSelector::new(&config).select(&m);

        assert!(selection.keep_everyone);
        assert_eq!(selection.kept, vec![0, 1, 2]);
        assert!(selection.pruned.is_empty());
    }

    #[test]
    fn test_required_capped_by_column_count() {
        let m = mapping(3, &[("a", &[0, 1, 2]), ("b", &[0, 1, 2])]);
        let config = SelectorConfig::default();
        let selection = CoverageSelector::new(&config).select(&m);

        assert_eq!(selection.required_overlap, 2);
        assert!(!selection.keep_everyone);
    }

    #[test]
    fn test_empty_mapping() {
        let m = CanonicalKeyMapping::new(0);
        let config = SelectorConfig::default();
        let selection = CoverageSelector::new(&config).select(&m);

        assert!(selection.keys.is_empty());
        assert!(selection.kept.is_empty());
    }
}
