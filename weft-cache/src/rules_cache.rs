//! The smaller persisted blob: the last-seen aspect-rule-name set.
//!
//! Kept separate from the full snapshot so rule-delta checks stay cheap.
//! Same write discipline as the snapshot: full overwrite, atomic rename.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::warn;

use weft_core::errors::CacheError;

use crate::snapshot::write_atomic;

#[derive(Debug, Clone)]
pub struct RuleNameCache {
    path: PathBuf,
}

impl RuleNameCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join("aspects.names"),
        }
    }

    /// The previously stored rule-name set. Absent or corrupt state is an
    /// empty set, never an error.
    pub fn load(&self) -> BTreeSet<String> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeSet::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "rule-name cache unreadable, treating as empty");
                return BTreeSet::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(names) => names,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "rule-name cache corrupt, treating as empty");
                BTreeSet::new()
            }
        }
    }

    pub fn store(&self, names: &BTreeSet<String>) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(names).map_err(|e| CacheError::Serialize {
            message: e.to_string(),
        })?;
        write_atomic(&self.path, &bytes)
    }
}
