//! The scan coordinator: walks roots, populates the metadata store,
//! resolves the weave set, materializes proxies, and commits one
//! consolidated snapshot, all under cross-process single-scan ownership.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use weft_cache::{
    CacheSnapshot, ProxyCache, ProxyGenerator, RuleNameCache, ScanLease, SnapshotStore,
    StubGenerator,
};
use weft_core::config::{load_rules, AspectDecl, WeftConfig};
use weft_core::errors::{CacheError, ConfigError, PipelineError};
use weft_core::metadata::MetadataStore;
use weft_core::types::collections::FxHashSet;
use weft_core::types::declaration::mtime_millis;
use weft_core::types::{AspectRegistry, Declaration, RuleSource};

use super::introspect::{Introspector, RawDecl, TextIntrospector};
use super::types::{DiscoveredFile, ScanOutput, ScanStats};
use super::walker::FileWalker;
use crate::{matcher, tracker};

/// Marker name that declares an aspect on its own type.
const ASPECT_MARKER: &str = "Aspect";

/// Orchestrates one pipeline run per fleet of concurrently booting
/// workers: whoever wins the lease walks, everyone else restores the
/// snapshot the winner commits.
pub struct ScanCoordinator {
    config: WeftConfig,
    config_dir: Option<PathBuf>,
    defaults: Vec<AspectDecl>,
    introspector: Box<dyn Introspector>,
    proxies: ProxyCache,
    snapshots: SnapshotStore,
    rule_names: RuleNameCache,
}

impl ScanCoordinator {
    pub fn new(config: WeftConfig) -> Self {
        Self::with_parts(config, Box::new(TextIntrospector), Box::new(StubGenerator))
    }

    /// Construct with explicit introspection and generation seams.
    pub fn with_parts(
        config: WeftConfig,
        introspector: Box<dyn Introspector>,
        generator: Box<dyn ProxyGenerator>,
    ) -> Self {
        let snapshots = SnapshotStore::new(&config.cache.dir);
        let rule_names = RuleNameCache::new(&config.cache.dir);
        let proxies = ProxyCache::new(&config.cache.proxy_dir, generator);
        Self {
            config,
            config_dir: None,
            defaults: Vec::new(),
            introspector,
            proxies,
            snapshots,
            rule_names,
        }
    }

    /// Directory holding `weft.toml` / `aspects.toml` rule sources.
    pub fn with_config_dir(mut self, dir: &Path) -> Self {
        self.config_dir = Some(dir.to_path_buf());
        self
    }

    /// Library-provided default aspect rules.
    pub fn with_default_rules(mut self, rules: Vec<AspectDecl>) -> Self {
        self.defaults = rules;
        self
    }

    /// Run the pipeline and return the artifact maps for container wiring.
    pub fn scan(&mut self) -> Result<ScanOutput, PipelineError> {
        let start = Instant::now();

        // Fast path: frozen source tree, any committed snapshot answers.
        if self.config.cache.cacheable {
            if let Some(snapshot) = self.snapshots.load() {
                info!("cacheable snapshot present, skipping scan");
                return Ok(self.output_from_snapshot(snapshot, start));
            }
        }

        let wait_start_ms = mtime_millis(SystemTime::now());
        let mut lease = ScanLease::open(&self.config.cache.dir)?;
        let deadline =
            Instant::now() + Duration::from_millis(self.config.cache.lease_timeout_ms);
        let poll = Duration::from_millis(self.config.cache.lease_poll_ms);

        loop {
            if let Some(guard) = lease.try_acquire()? {
                // Another owner may have finished while we queued.
                let result = match self.snapshot_since(wait_start_ms) {
                    Some(snapshot) => Ok(self.output_from_snapshot(snapshot, start)),
                    None => self.run_as_owner(start),
                };
                drop(guard);
                return result;
            }
            if let Some(snapshot) = self.snapshot_since(wait_start_ms) {
                return Ok(self.output_from_snapshot(snapshot, start));
            }
            if Instant::now() >= deadline {
                // The owner may have stalled rather than crashed. One last
                // steal attempt before giving up.
                if let Some(guard) = lease.try_acquire()? {
                    let result = self.run_as_owner(start);
                    drop(guard);
                    return result;
                }
                return Err(CacheError::OwnershipTimeout {
                    timeout_ms: self.config.cache.lease_timeout_ms,
                }
                .into());
            }
            std::thread::sleep(poll);
        }
    }

    /// A snapshot committed at or after `since_ms`, if one exists.
    fn snapshot_since(&self, since_ms: i64) -> Option<CacheSnapshot> {
        self.snapshots.load().filter(|s| s.written_at_ms >= since_ms)
    }

    fn output_from_snapshot(&mut self, snapshot: CacheSnapshot, start: Instant) -> ScanOutput {
        self.proxies.restore(snapshot.proxies.clone());
        let proxies = snapshot
            .proxies
            .into_iter()
            .map(|(id, record)| (id, record.artifact))
            .collect();
        ScanOutput {
            proxies,
            aspect_targets: snapshot.aspect_targets,
            weave: snapshot.weave,
            stats: ScanStats {
                declarations: snapshot.store.len(),
                restored: true,
                duration_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            },
        }
    }

    /// The owning process's full pipeline: walk, introspect, diff, match,
    /// materialize, commit.
    fn run_as_owner(&mut self, start: Instant) -> Result<ScanOutput, PipelineError> {
        let (mut store, last_write_ms, previous_decls) = match self.snapshots.load() {
            Some(snapshot) => {
                self.proxies.restore(snapshot.proxies.clone());
                (
                    snapshot.store,
                    snapshot.written_at_ms,
                    snapshot.seen_declarations,
                )
            }
            None => (MetadataStore::new(), 0, BTreeSet::new()),
        };

        let walker =
            FileWalker::new(&self.config.scan.include, self.config.scan.max_file_size)?;
        let files = walker.discover(&self.config.scan.roots)?;

        // Re-introspect only files modified at or after the last commit.
        let introspector = self.introspector.as_ref();
        let parsed: Vec<(&DiscoveredFile, Vec<RawDecl>)> = files
            .par_iter()
            .filter(|file| file.mtime_ms >= last_write_ms)
            .filter_map(|file| match std::fs::read_to_string(&file.path) {
                Ok(source) => Some((file, introspector.introspect(&file.path, &source))),
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "file unreadable, skipping");
                    None
                }
            })
            .collect();
        let introspected_files = parsed.len();

        for (file, decls) in parsed {
            // Full replacement per file: declarations deleted from a
            // still-existing file must not survive the re-scan.
            for identity in store.identities_in_file(&file.path) {
                store.clear(&identity);
            }
            for raw in decls {
                store.record(
                    Declaration {
                        name: raw.name,
                        kind: raw.kind,
                        file: file.path.clone(),
                        mtime_ms: file.mtime_ms,
                    },
                    raw.markers,
                );
            }
        }

        // Declarations whose file vanished from the walk are gone.
        let walked: FxHashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let gone: Vec<String> = store
            .iter()
            .filter(|(_, e)| !walked.contains(e.declaration.file.as_path()))
            .map(|(identity, _)| identity.to_string())
            .collect();
        for identity in &gone {
            store.clear(identity);
        }

        let decl_delta = tracker::diff_identity_sets(&previous_decls, &store.identity_set());
        debug!(
            added = decl_delta.changed.len(),
            removed = decl_delta.removed.len(),
            "declaration delta"
        );

        // Aspect rules: in-source declarations at the lowest specificity,
        // then defaults, project config, and the deployment override.
        let mut registry = AspectRegistry::new();
        collect_declared_rules(&store, &mut registry)?;
        load_rules(
            &self.config,
            self.config_dir.as_deref(),
            &self.defaults,
            &mut registry,
        )?;

        let current_rules: BTreeSet<String> = registry.names().map(String::from).collect();
        let previous_rules = self.rule_names.load();
        let rules_delta =
            tracker::rule_delta(&previous_rules, &current_rules, &store, last_write_ms);
        if !rules_delta.removed.is_empty() || !rules_delta.changed.is_empty() {
            debug!(
                removed = rules_delta.removed.len(),
                changed = rules_delta.changed.len(),
                "aspect rule delta"
            );
        }

        let weave = matcher::resolve(&registry, &store);
        let proxies = self.proxies.materialize(&weave, &store)?;
        let aspect_targets = self.proxies.aspect_to_targets(&weave);

        // Commit order: the small rule-name blob first, then the one
        // consolidated snapshot that signals completion to waiters.
        self.rule_names.store(&current_rules)?;
        let snapshot = CacheSnapshot::new(
            store,
            current_rules,
            self.proxies.records().clone(),
            weave.clone(),
            aspect_targets.clone(),
        );
        self.snapshots.commit(&snapshot)?;
        info!(
            declarations = snapshot.store.len(),
            woven = weave.len(),
            "scan committed"
        );

        Ok(ScanOutput {
            proxies,
            aspect_targets,
            weave,
            stats: ScanStats {
                walked_files: files.len(),
                introspected_files,
                declarations: snapshot.store.len(),
                removed_declarations: decl_delta.removed.len(),
                changed_rules: rules_delta.changed.len(),
                removed_rules: rules_delta.removed.len(),
                restored: false,
                duration_ms: start.elapsed().as_millis() as u64,
            },
        })
    }
}

/// Fold `#[Aspect(classes = ..., annotations = ..., priority = ...)]`
/// markers on type declarations into the rule registry.
fn collect_declared_rules(
    store: &MetadataStore,
    registry: &mut AspectRegistry,
) -> Result<(), ConfigError> {
    for entry in store.types() {
        for marker in entry.markers.iter().filter(|m| m.name == ASPECT_MARKER) {
            let classes: Vec<String> = marker
                .args
                .iter()
                .filter(|(k, _)| k == "classes")
                .map(|(_, v)| v.clone())
                .collect();
            let annotations: Vec<String> = marker
                .args
                .iter()
                .filter(|(k, _)| k == "annotations")
                .map(|(_, v)| v.clone())
                .collect();
            let priority = match marker.arg("priority") {
                Some(raw) => match raw.parse::<i32>() {
                    Ok(p) => Some(p),
                    Err(_) => {
                        warn!(
                            aspect = %entry.declaration.name,
                            value = raw,
                            "non-numeric aspect priority, ignoring"
                        );
                        None
                    }
                },
                None => None,
            };
            registry.merge(
                &entry.declaration.name,
                &classes,
                &annotations,
                priority,
                RuleSource::Declared,
            )?;
        }
    }
    Ok(())
}
