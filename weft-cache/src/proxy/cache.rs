//! Per-declaration proxy records and the materialize/invalidate logic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use weft_core::errors::CacheError;
use weft_core::metadata::MetadataStore;
use weft_core::types::WeaveSet;

use super::generator::ProxyGenerator;

/// What we remember about one generated artifact.
///
/// Invariant: the artifact is stale iff the declaration's current source
/// mtime is newer than `source_mtime_ms`, or the record/artifact is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub artifact: PathBuf,
    /// The source file's mtime at the moment of generation.
    pub source_mtime_ms: i64,
}

/// Decides per weave target whether to regenerate, and keeps the
/// identity → artifact map consistent with the current weave set.
pub struct ProxyCache {
    proxy_dir: PathBuf,
    records: BTreeMap<String, ProxyRecord>,
    generator: Box<dyn ProxyGenerator>,
}

impl ProxyCache {
    pub fn new(proxy_dir: &Path, generator: Box<dyn ProxyGenerator>) -> Self {
        Self {
            proxy_dir: proxy_dir.to_path_buf(),
            records: BTreeMap::new(),
            generator,
        }
    }

    /// Seed records from a restored snapshot.
    pub fn restore(&mut self, records: BTreeMap<String, ProxyRecord>) {
        self.records = records;
    }

    /// The record map, for snapshot persistence.
    pub fn records(&self) -> &BTreeMap<String, ProxyRecord> {
        &self.records
    }

    /// Materialize artifacts for every target in the weave set.
    ///
    /// Fresh artifacts are reused unchanged; stale or missing ones are
    /// regenerated through the generator seam. Records (and artifact
    /// files) for targets that dropped out of the weave set are removed:
    /// artifact presence must imply weave membership.
    pub fn materialize(
        &mut self,
        weave: &WeaveSet,
        store: &MetadataStore,
    ) -> Result<BTreeMap<String, PathBuf>, CacheError> {
        std::fs::create_dir_all(&self.proxy_dir).map_err(|e| CacheError::Io {
            path: self.proxy_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut out = BTreeMap::new();
        for (target, aspects) in weave.iter() {
            if aspects.is_empty() {
                continue;
            }
            let Some(entry) = store.get(target) else {
                warn!(target, "weave target has no collected declaration, skipping");
                continue;
            };

            let artifact = self.artifact_path(target);
            let stale = match self.records.get(target) {
                None => true,
                Some(record) => {
                    !record.artifact.exists()
                        || entry.declaration.mtime_ms > record.source_mtime_ms
                }
            };

            if stale {
                let code = self.generator.generate(entry, aspects)?;
                std::fs::write(&artifact, code).map_err(|e| CacheError::Io {
                    path: artifact.display().to_string(),
                    message: e.to_string(),
                })?;
                debug!(target, artifact = %artifact.display(), "proxy regenerated");
                self.records.insert(
                    target.to_string(),
                    ProxyRecord {
                        artifact: artifact.clone(),
                        source_mtime_ms: entry.declaration.mtime_ms,
                    },
                );
            }
            out.insert(target.to_string(), artifact);
        }

        self.remove_orphans(weave);
        Ok(out)
    }

    /// Per-aspect view of the artifact map, for container interception
    /// wiring: aspect name → (target identity → artifact path).
    pub fn aspect_to_targets(
        &self,
        weave: &WeaveSet,
    ) -> BTreeMap<String, BTreeMap<String, PathBuf>> {
        let mut out: BTreeMap<String, BTreeMap<String, PathBuf>> = BTreeMap::new();
        for (target, aspects) in weave.iter() {
            let Some(record) = self.records.get(target) else {
                continue;
            };
            for aspect in aspects {
                out.entry(aspect.clone())
                    .or_default()
                    .insert(target.to_string(), record.artifact.clone());
            }
        }
        out
    }

    fn remove_orphans(&mut self, weave: &WeaveSet) {
        let orphans: Vec<String> = self
            .records
            .keys()
            .filter(|id| !weave.contains(id))
            .cloned()
            .collect();
        for id in orphans {
            if let Some(record) = self.records.remove(&id) {
                match std::fs::remove_file(&record.artifact) {
                    Ok(()) => debug!(target = %id, "orphan artifact removed"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(target = %id, error = %e, "failed to remove orphan artifact")
                    }
                }
            }
        }
    }

    fn artifact_path(&self, identity: &str) -> PathBuf {
        let flat = identity.replace("::", "_").replace('\\', "_");
        self.proxy_dir.join(format!("{flat}.proxy.src"))
    }
}
