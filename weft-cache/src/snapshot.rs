//! The consolidated cache snapshot and its on-disk store.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use weft_core::errors::CacheError;
use weft_core::metadata::MetadataStore;
use weft_core::types::declaration::mtime_millis;
use weft_core::types::WeaveSet;

use crate::proxy::ProxyRecord;

/// Bump when the snapshot layout changes; a mismatch is treated as an
/// absent snapshot, triggering a full re-scan.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything one run persists for the next: collected metadata, the
/// last-seen identity sets, and the proxy record map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub version: u32,
    /// Wall-clock commit time, milliseconds since epoch. Files modified at
    /// or after this instant are re-collected on the next run.
    pub written_at_ms: i64,
    pub store: MetadataStore,
    pub seen_declarations: BTreeSet<String>,
    pub seen_aspects: BTreeSet<String>,
    pub proxies: BTreeMap<String, ProxyRecord>,
    /// The weave set and its per-aspect artifact view, persisted so a
    /// fresh-cache run can answer without recomputing the match.
    pub weave: WeaveSet,
    pub aspect_targets: BTreeMap<String, BTreeMap<String, PathBuf>>,
}

impl CacheSnapshot {
    pub fn new(
        store: MetadataStore,
        seen_aspects: BTreeSet<String>,
        proxies: BTreeMap<String, ProxyRecord>,
        weave: WeaveSet,
        aspect_targets: BTreeMap<String, BTreeMap<String, PathBuf>>,
    ) -> Self {
        let seen_declarations = store.identity_set();
        Self {
            version: SNAPSHOT_VERSION,
            written_at_ms: mtime_millis(SystemTime::now()),
            store,
            seen_declarations,
            seen_aspects,
            proxies,
            weave,
            aspect_targets,
        }
    }
}

/// Loads and commits snapshots at a fixed path.
///
/// The only write operation is a full rewrite: serialize next to the
/// target and atomically rename over it, so a crash mid-write can never
/// leave a torn snapshot visible to a concurrent waiter.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join("scan.snapshot"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted snapshot. Unreadable, unparseable, or
    /// version-mismatched state is logged and treated as absent.
    pub fn load(&self) -> Option<CacheSnapshot> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot unreadable, treating as absent");
                return None;
            }
        };
        let snapshot: CacheSnapshot = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot corrupt, treating as absent");
                return None;
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                found = snapshot.version,
                expected = SNAPSHOT_VERSION,
                "snapshot version mismatch, treating as absent"
            );
            return None;
        }
        debug!(path = %self.path.display(), declarations = snapshot.seen_declarations.len(), "snapshot loaded");
        Some(snapshot)
    }

    /// Commit a snapshot: full serialize, then atomic replace.
    pub fn commit(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(snapshot).map_err(|e| CacheError::Serialize {
            message: e.to_string(),
        })?;
        write_atomic(&self.path, &bytes)
    }
}

/// Write `bytes` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(|e| CacheError::Io {
        path: tmp.display().to_string(),
        message: e.to_string(),
    })?;
    std::fs::rename(&tmp, path).map_err(|e| CacheError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_snapshot_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_snapshot_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(store.path(), b"{ not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn version_mismatch_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut snapshot = CacheSnapshot::new(
            MetadataStore::new(),
            BTreeSet::new(),
            BTreeMap::new(),
            WeaveSet::new(),
            BTreeMap::new(),
        );
        snapshot.version = SNAPSHOT_VERSION + 1;
        store.commit(&snapshot).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn commit_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let snapshot = CacheSnapshot::new(
            MetadataStore::new(),
            BTreeSet::from(["App\\Aspect\\Log".to_string()]),
            BTreeMap::new(),
            WeaveSet::new(),
            BTreeMap::new(),
        );
        store.commit(&snapshot).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, snapshot);
        // No temp file left behind.
        assert!(!store.path().with_extension("tmp").exists());
    }
}
