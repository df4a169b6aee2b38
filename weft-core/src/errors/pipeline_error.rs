//! Pipeline errors: aggregation of subsystem errors via `From` conversions.

use super::{CacheError, ConfigError, ScanError};

/// Errors that can abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
