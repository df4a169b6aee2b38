//! Change tracking between the current walk and the last persisted run.
//!
//! Deltas are by identity, not content: a renamed declaration is a
//! remove plus an add. Aspect rules additionally use their declaring
//! file's modification time as the staleness signal, because a rule's
//! *name* surviving says nothing about its pattern lists.

use std::collections::BTreeSet;

use tracing::debug;

use weft_core::metadata::MetadataStore;

/// Identity-level difference between two runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDelta {
    /// Present last run, absent now.
    pub removed: BTreeSet<String>,
    /// Present now: new, or stale enough to need re-processing.
    pub changed: BTreeSet<String>,
}

/// `removed = previous − current`, `changed = current − previous`.
pub fn diff_identity_sets(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> SetDelta {
    SetDelta {
        removed: previous.difference(current).cloned().collect(),
        changed: current.difference(previous).cloned().collect(),
    }
}

/// Rule-namespace delta. A rule counts as changed when it is newly named
/// *or* its declaring file was modified at or after the last snapshot
/// write. A rule whose aspect has no collected declaration cannot be
/// mtime-checked and is treated as changed.
pub fn rule_delta(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
    store: &MetadataStore,
    last_write_ms: i64,
) -> SetDelta {
    let mut delta = diff_identity_sets(previous, current);

    for name in current {
        if delta.changed.contains(name) {
            continue;
        }
        match store.get(name) {
            Some(entry) if entry.declaration.mtime_ms >= last_write_ms => {
                delta.changed.insert(name.clone());
            }
            Some(_) => {}
            None => {
                debug!(aspect = %name, "aspect rule has no collected declaration, treating as changed");
                delta.changed.insert(name.clone());
            }
        }
    }

    delta
}
