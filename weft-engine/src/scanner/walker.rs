//! Root directory walking with include globs.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::warn;

use weft_core::errors::ScanError;
use weft_core::types::declaration::mtime_millis;

use super::types::DiscoveredFile;

/// Enumerates declaration-bearing files under a set of roots.
pub struct FileWalker {
    include: GlobSet,
    max_file_size: u64,
}

impl FileWalker {
    pub fn new(include_patterns: &[String], max_file_size: u64) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in include_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let include = builder.build().map_err(|e| ScanError::InvalidPattern {
            pattern: include_patterns.join(", "),
            message: e.to_string(),
        })?;
        Ok(Self {
            include,
            max_file_size,
        })
    }

    /// Walk the existing roots and collect matching files, sorted by path.
    ///
    /// Non-existent roots are dropped; a non-empty root list where nothing
    /// exists is fatal. Individually unreadable files are skipped with a
    /// diagnostic.
    pub fn discover(&self, roots: &[PathBuf]) -> Result<Vec<DiscoveredFile>, ScanError> {
        let existing: Vec<&PathBuf> = roots.iter().filter(|r| r.is_dir()).collect();
        if !roots.is_empty() && existing.is_empty() {
            return Err(ScanError::MissingRoot {
                configured: roots.len(),
            });
        }

        let mut files = Vec::new();
        for root in existing {
            for result in WalkBuilder::new(root).follow_links(false).build() {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(root = %root.display(), error = %e, "walk entry unreadable, skipping");
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if !self.matches(root, entry.path()) {
                    continue;
                }
                let meta = match entry.metadata() {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "file metadata unreadable, skipping");
                        continue;
                    }
                };
                if meta.len() > self.max_file_size {
                    warn!(path = %entry.path().display(), size = meta.len(), "file exceeds max size, skipping");
                    continue;
                }
                let mtime = meta
                    .modified()
                    .map(mtime_millis)
                    .unwrap_or_default();
                files.push(DiscoveredFile {
                    path: entry.into_path(),
                    mtime_ms: mtime,
                    size: meta.len(),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn matches(&self, root: &Path, path: &Path) -> bool {
        let rel = path.strip_prefix(root).unwrap_or(path);
        self.include.is_match(rel)
    }
}
