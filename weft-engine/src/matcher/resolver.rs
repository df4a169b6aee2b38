//! Resolves aspect rules against the metadata store into a weave set.

use tracing::warn;

use weft_core::metadata::MetadataStore;
use weft_core::types::collections::FxHashMap;
use weft_core::types::{AspectRegistry, WeaveSet};

use super::pattern::NamePattern;

/// Compute the weave set: for every type declaration, the ordered aspects
/// that must wrap it.
///
/// Literal patterns hit the name and marker indexes directly; only
/// wildcard patterns fall back to a linear pass, keeping cost near-linear
/// in total pattern count. A literal class pattern naming a declaration
/// that was never collected is a non-fatal diagnostic, not an error.
pub fn resolve(registry: &AspectRegistry, store: &MetadataStore) -> WeaveSet {
    let mut weave = WeaveSet::new();

    let type_names: Vec<&str> = store.types().map(|e| e.declaration.name.as_str()).collect();
    let type_index: FxHashMap<&str, ()> = type_names.iter().map(|&n| (n, ())).collect();

    for rule in registry.iter() {
        for raw in &rule.classes {
            let pattern = NamePattern::new(raw);
            match pattern.as_literal() {
                Some(name) => {
                    if type_index.contains_key(name) {
                        weave.add(name, &rule.aspect);
                    } else {
                        warn!(
                            aspect = %rule.aspect,
                            target = name,
                            "aspect rule references a declaration that does not exist, skipping"
                        );
                    }
                }
                None => {
                    for &name in &type_names {
                        if pattern.matches(name) {
                            weave.add(name, &rule.aspect);
                        }
                    }
                }
            }
        }

        for raw in &rule.annotations {
            let pattern = NamePattern::new(raw);
            match pattern.as_literal() {
                Some(marker) => {
                    add_marker_owners(&mut weave, store, &type_index, marker, &rule.aspect);
                }
                None => {
                    for &name in &type_names {
                        let markers = store.markers_for_type(name);
                        if markers.iter().any(|m| pattern.matches(m)) {
                            weave.add(name, &rule.aspect);
                        }
                    }
                }
            }
        }
    }

    // Priority ascending, unspecified priorities last, discovery order as
    // the final tie-break.
    let order_key: FxHashMap<&str, (bool, i32, usize)> = registry
        .iter()
        .map(|r| {
            (
                r.aspect.as_str(),
                (r.priority.is_none(), r.priority.unwrap_or(0), r.order),
            )
        })
        .collect();
    weave.sort_by(|a, b| {
        let ka = order_key.get(a).copied().unwrap_or((true, 0, usize::MAX));
        let kb = order_key.get(b).copied().unwrap_or((true, 0, usize::MAX));
        ka.cmp(&kb)
    });

    weave
}

/// Weave `aspect` into every type owning a declaration that carries
/// `marker`, directly or on one of its members.
fn add_marker_owners(
    weave: &mut WeaveSet,
    store: &MetadataStore,
    type_index: &FxHashMap<&str, ()>,
    marker: &str,
    aspect: &str,
) {
    let owners: Vec<String> = store
        .markers_by_name(marker)
        .filter_map(|identity| {
            let entry = store.get(identity)?;
            let owner = entry.declaration.type_name();
            type_index.contains_key(owner).then(|| owner.to_string())
        })
        .collect();
    for owner in owners {
        weave.add(&owner, aspect);
    }
}
