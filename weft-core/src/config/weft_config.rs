//! Top-level Weft configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::rule_sources::AspectDecl;
use crate::errors::ConfigError;

/// Scan settings: where to walk and what to pick up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Root directories to walk. A non-empty list where no entry exists is
    /// a fatal configuration problem at scan time.
    pub roots: Vec<PathBuf>,
    /// Include globs for declaration-bearing source files.
    pub include: Vec<String>,
    /// Files larger than this are skipped with a warning.
    pub max_file_size: u64,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            include: vec!["**/*.src".to_string()],
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Cache settings: persistence locations and the ownership lease bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Directory holding the snapshot, rule-name cache, and lease file.
    pub dir: PathBuf,
    /// Directory generated proxy artifacts are written into.
    pub proxy_dir: PathBuf,
    /// When true, an existing snapshot short-circuits the scan entirely
    /// (production-style frozen source tree).
    pub cacheable: bool,
    /// Bounded wait for another process's scan to complete.
    pub lease_timeout_ms: u64,
    /// Poll interval while waiting on the lease.
    pub lease_poll_ms: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("runtime/cache"),
            proxy_dir: PathBuf::from("runtime/proxy"),
            cacheable: false,
            lease_timeout_ms: 30_000,
            lease_poll_ms: 50,
        }
    }
}

/// Top-level configuration.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`WEFT_*`)
/// 2. Deployment override file (`aspects.toml` in the config dir,
///    aspect rules only)
/// 3. Project config (`weft.toml` in the config dir)
/// 4. Compiled defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    pub scan: ScanSection,
    pub cache: CacheSection,
    /// Aspect rules declared in the project config.
    pub aspects: Vec<AspectDecl>,
}

impl WeftConfig {
    /// Load configuration from `config_dir/weft.toml` with env overrides.
    /// A missing project file falls back to compiled defaults.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project = config_dir.join("weft.toml");
        if project.exists() {
            let text = std::fs::read_to_string(&project).map_err(|e| {
                ConfigError::ReadFailed {
                    path: project.display().to_string(),
                    message: e.to_string(),
                }
            })?;
            config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                path: project.display().to_string(),
                message: e.to_string(),
            })?;
        }

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the final merged configuration.
    pub fn validate(config: &WeftConfig) -> Result<(), ConfigError> {
        if config.cache.lease_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "cache.lease_timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if config.cache.lease_poll_ms == 0
            || config.cache.lease_poll_ms > config.cache.lease_timeout_ms
        {
            return Err(ConfigError::ValidationFailed {
                field: "cache.lease_poll_ms".to_string(),
                message: "must be between 1 and cache.lease_timeout_ms".to_string(),
            });
        }
        if config.scan.max_file_size == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "scan.max_file_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn apply_env_overrides(config: &mut WeftConfig) {
        if let Some(v) = env_bool("WEFT_CACHEABLE") {
            config.cache.cacheable = v;
        }
        if let Some(v) = env_u64("WEFT_LEASE_TIMEOUT_MS") {
            config.cache.lease_timeout_ms = v;
        }
        if let Some(v) = env_u64("WEFT_MAX_FILE_SIZE") {
            config.scan.max_file_size = v;
        }
        if let Ok(v) = std::env::var("WEFT_CACHE_DIR") {
            config.cache.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("WEFT_PROXY_DIR") {
            config.cache.proxy_dir = PathBuf::from(v);
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}
