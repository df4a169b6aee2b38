//! Keyed storage of declarations and their markers, with an inverted
//! marker-name index for matching.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::collections::FxHashMap;
use crate::types::{DeclKind, Declaration, Marker};

/// A declaration plus the markers collected from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclEntry {
    pub declaration: Declaration,
    pub markers: Vec<Marker>,
}

/// Stores collected facts keyed by declaration identity.
///
/// An entry is fully replaced by `record` or removed by `clear`; there is
/// no partial update. The inverted marker index is a pure derivative of
/// the entries and is rebuilt on deserialization rather than persisted.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MetadataStore {
    entries: BTreeMap<String, DeclEntry>,
    #[serde(skip)]
    by_marker: FxHashMap<String, BTreeSet<String>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite a declaration's entry.
    pub fn record(&mut self, declaration: Declaration, markers: Vec<Marker>) {
        let identity = declaration.name.clone();
        self.unindex(&identity);
        for marker in &markers {
            self.by_marker
                .entry(marker.name.clone())
                .or_default()
                .insert(identity.clone());
        }
        self.entries.insert(
            identity,
            DeclEntry {
                declaration,
                markers,
            },
        );
    }

    /// Remove a declaration's entry. Unknown identities are a no-op.
    pub fn clear(&mut self, identity: &str) {
        self.unindex(identity);
        self.entries.remove(identity);
    }

    pub fn get(&self, identity: &str) -> Option<&DeclEntry> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Inverted-index lookup: identities carrying a marker with this name.
    pub fn markers_by_name(&self, marker_name: &str) -> impl Iterator<Item = &str> {
        self.by_marker
            .get(marker_name)
            .into_iter()
            .flat_map(|ids| ids.iter().map(|s| s.as_str()))
    }

    /// All entries, in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeclEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Type-kind entries only, in identity order.
    pub fn types(&self) -> impl Iterator<Item = &DeclEntry> {
        self.entries
            .values()
            .filter(|e| e.declaration.kind == DeclKind::Type)
    }

    /// The full identity set, for change tracking.
    pub fn identity_set(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Identities of declarations collected from `file`.
    pub fn identities_in_file(&self, file: &std::path::Path) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.declaration.file == file)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Marker names attached to a type and to its `Type::member` children,
    /// aggregated for annotation-pattern matching.
    pub fn markers_for_type(&self, type_name: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let prefix = format!("{type_name}::");
        // Own markers, then members via the ordered key range.
        if let Some(entry) = self.entries.get(type_name) {
            names.extend(entry.markers.iter().map(|m| m.name.clone()));
        }
        for (_, entry) in self
            .entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
        {
            names.extend(entry.markers.iter().map(|m| m.name.clone()));
        }
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unindex(&mut self, identity: &str) {
        if let Some(existing) = self.entries.get(identity) {
            for marker in &existing.markers {
                if let Some(ids) = self.by_marker.get_mut(&marker.name) {
                    ids.remove(identity);
                    if ids.is_empty() {
                        self.by_marker.remove(&marker.name);
                    }
                }
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.by_marker.clear();
        for (identity, entry) in &self.entries {
            for marker in &entry.markers {
                self.by_marker
                    .entry(marker.name.clone())
                    .or_default()
                    .insert(identity.clone());
            }
        }
    }
}

impl<'de> Deserialize<'de> for MetadataStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            entries: BTreeMap<String, DeclEntry>,
        }
        let raw = Raw::deserialize(deserializer)?;
        let mut store = MetadataStore {
            entries: raw.entries,
            by_marker: FxHashMap::default(),
        };
        store.rebuild_index();
        Ok(store)
    }
}

impl PartialEq for MetadataStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for MetadataStore {}
