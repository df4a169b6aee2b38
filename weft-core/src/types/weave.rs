//! The weave set: which aspects wrap which declarations, in what order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result of aspect matching, recomputed from scratch every run.
///
/// Maps a declaration identity to the ordered list of aspect names that
/// must wrap it. Order is priority ascending (lower number weaves outer),
/// unspecified priorities last, aspect discovery order as the final
/// tie-break. Each aspect appears at most once per target even when both a
/// class pattern and an annotation pattern of the same aspect match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaveSet {
    targets: BTreeMap<String, Vec<String>>,
}

impl WeaveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an aspect to a target, keeping at most one occurrence.
    /// Final ordering is applied by the matcher once all matches are in.
    pub fn add(&mut self, target: &str, aspect: &str) {
        let aspects = self.targets.entry(target.to_string()).or_default();
        if !aspects.iter().any(|a| a == aspect) {
            aspects.push(aspect.to_string());
        }
    }

    pub fn aspects_for(&self, target: &str) -> Option<&[String]> {
        self.targets.get(target).map(|v| v.as_slice())
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }

    /// Targets with their woven aspects, in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Re-order every target's aspect list with the given comparator.
    pub fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&str, &str) -> std::cmp::Ordering,
    {
        for aspects in self.targets.values_mut() {
            aspects.sort_by(|a, b| cmp(a, b));
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
