//! Scanner data types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use weft_core::types::WeaveSet;

/// One file picked up by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Modification time in milliseconds since epoch.
    pub mtime_ms: i64,
    pub size: u64,
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Files the walker discovered.
    pub walked_files: usize,
    /// Files actually re-introspected (new or modified since last write).
    pub introspected_files: usize,
    /// Declarations in the store after the run.
    pub declarations: usize,
    /// Declarations removed since the last run.
    pub removed_declarations: usize,
    /// Aspect rules newly named or whose declaring file changed.
    pub changed_rules: usize,
    /// Aspect rules that vanished since the last run.
    pub removed_rules: usize,
    /// True when the run restored a snapshot instead of walking.
    pub restored: bool,
    pub duration_ms: u64,
}

/// What the pipeline hands to the container-wiring collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Declaration identity → generated artifact path, for class-loading
    /// substitution.
    pub proxies: BTreeMap<String, PathBuf>,
    /// Aspect name → (identity → artifact path), for interception wiring.
    pub aspect_targets: BTreeMap<String, BTreeMap<String, PathBuf>>,
    /// The weave decision this run was based on.
    pub weave: WeaveSet,
    pub stats: ScanStats,
}
