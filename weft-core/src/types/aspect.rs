//! Aspect rules and the registry that merges partial declarations.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::collections::FxHashMap;

/// Where a (partial) aspect rule came from. Higher wins for priority when
/// two sources both set one explicitly; pattern lists always union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleSource {
    /// `#[Aspect(...)]` marker on the aspect's own declaration.
    Declared,
    /// Library-provided defaults registered in code.
    Defaults,
    /// Project configuration file (`weft.toml`).
    Config,
    /// Per-deployment override file (`aspects.toml`).
    Override,
}

/// A fully merged aspect rule: exactly one per aspect name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRule {
    /// The aspect's own declaration name.
    pub aspect: String,
    /// Target type-name patterns (`*` wildcards, optional `::member` suffix).
    pub classes: Vec<String>,
    /// Target marker-name patterns.
    pub annotations: Vec<String>,
    /// Explicit priority; lower weaves outer. `None` sorts after all
    /// explicit priorities.
    pub priority: Option<i32>,
    /// Discovery order, used as the final ordering tie-break.
    pub order: usize,
    /// Source that set `priority`, tracked for conflict detection.
    priority_source: Option<RuleSource>,
}

impl AspectRule {
    fn new(aspect: String, order: usize) -> Self {
        Self {
            aspect,
            classes: Vec::new(),
            annotations: Vec::new(),
            priority: None,
            order,
            priority_source: None,
        }
    }
}

/// Collects partial aspect rule declarations from every source and merges
/// them into one rule per aspect name. Rebuilt from sources each run, never
/// persisted.
#[derive(Debug, Default, Clone)]
pub struct AspectRegistry {
    rules: Vec<AspectRule>,
    index: FxHashMap<String, usize>,
    /// Never reused, so discovery orders stay unique across `clear`.
    next_order: usize,
}

impl AspectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one partial declaration into the registry.
    ///
    /// Pattern lists union across sources. An explicit priority from a more
    /// specific source replaces one from a less specific source; two
    /// differing explicit priorities at the same specificity are a fatal
    /// configuration error.
    pub fn merge(
        &mut self,
        aspect: &str,
        classes: &[String],
        annotations: &[String],
        priority: Option<i32>,
        source: RuleSource,
    ) -> Result<(), ConfigError> {
        let idx = match self.index.get(aspect) {
            Some(&i) => i,
            None => {
                let i = self.rules.len();
                self.rules
                    .push(AspectRule::new(aspect.to_string(), self.next_order));
                self.next_order += 1;
                self.index.insert(aspect.to_string(), i);
                i
            }
        };
        let rule = &mut self.rules[idx];

        for pattern in classes {
            if !rule.classes.contains(pattern) {
                rule.classes.push(pattern.clone());
            }
        }
        for pattern in annotations {
            if !rule.annotations.contains(pattern) {
                rule.annotations.push(pattern.clone());
            }
        }

        if let Some(incoming) = priority {
            match (rule.priority, rule.priority_source) {
                (Some(existing), Some(held)) if existing != incoming => {
                    if source > held {
                        rule.priority = Some(incoming);
                        rule.priority_source = Some(source);
                    } else if source == held {
                        return Err(ConfigError::PriorityConflict {
                            aspect: aspect.to_string(),
                            first: existing,
                            second: incoming,
                        });
                    }
                    // A less specific source never demotes an explicit priority.
                }
                _ => {
                    rule.priority = Some(incoming);
                    rule.priority_source = Some(source);
                }
            }
        }

        Ok(())
    }

    /// Drop an aspect's rule entirely (e.g. removed from configuration).
    pub fn clear(&mut self, aspect: &str) {
        if self.index.remove(aspect).is_some() {
            self.rules.retain(|r| r.aspect != aspect);
            self.reindex();
        }
    }

    pub fn get(&self, aspect: &str) -> Option<&AspectRule> {
        self.index.get(aspect).map(|&i| &self.rules[i])
    }

    /// Rules in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &AspectRule> {
        self.rules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.aspect.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, r)| (r.aspect.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_union_across_sources() {
        let mut reg = AspectRegistry::new();
        reg.merge(
            "App\\Aspect\\Log",
            &["App\\Service\\*".to_string()],
            &[],
            None,
            RuleSource::Declared,
        )
        .unwrap();
        reg.merge(
            "App\\Aspect\\Log",
            &["App\\Repo\\*".to_string(), "App\\Service\\*".to_string()],
            &["Loggable".to_string()],
            None,
            RuleSource::Config,
        )
        .unwrap();

        let rule = reg.get("App\\Aspect\\Log").unwrap();
        assert_eq!(rule.classes, vec!["App\\Service\\*", "App\\Repo\\*"]);
        assert_eq!(rule.annotations, vec!["Loggable"]);
    }

    #[test]
    fn more_specific_source_wins_priority() {
        let mut reg = AspectRegistry::new();
        reg.merge("A", &[], &[], Some(10), RuleSource::Declared).unwrap();
        reg.merge("A", &[], &[], Some(5), RuleSource::Override).unwrap();
        assert_eq!(reg.get("A").unwrap().priority, Some(5));

        // A later, less specific source cannot demote it.
        reg.merge("A", &[], &[], Some(30), RuleSource::Defaults).unwrap();
        assert_eq!(reg.get("A").unwrap().priority, Some(5));
    }

    #[test]
    fn same_source_conflicting_priorities_are_fatal() {
        let mut reg = AspectRegistry::new();
        reg.merge("A", &[], &[], Some(5), RuleSource::Config).unwrap();
        let err = reg
            .merge("A", &[], &[], Some(7), RuleSource::Config)
            .unwrap_err();
        assert!(matches!(err, ConfigError::PriorityConflict { .. }));
    }

    #[test]
    fn clear_removes_rule_and_reindexes() {
        let mut reg = AspectRegistry::new();
        reg.merge("A", &[], &[], None, RuleSource::Defaults).unwrap();
        reg.merge("B", &[], &[], None, RuleSource::Defaults).unwrap();
        reg.clear("A");
        assert!(reg.get("A").is_none());
        assert_eq!(reg.get("B").unwrap().aspect, "B");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn orders_stay_unique_after_clear() {
        let mut reg = AspectRegistry::new();
        reg.merge("A", &[], &[], None, RuleSource::Defaults).unwrap();
        reg.merge("B", &[], &[], None, RuleSource::Defaults).unwrap();
        reg.clear("A");
        reg.merge("C", &[], &[], None, RuleSource::Defaults).unwrap();

        assert_ne!(reg.get("B").unwrap().order, reg.get("C").unwrap().order);
        // B was discovered before C; the tie-break must still say so.
        assert!(reg.get("B").unwrap().order < reg.get("C").unwrap().order);
    }
}
