//! Error handling for Weft.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod cache_error;
pub mod config_error;
pub mod pipeline_error;
pub mod scan_error;

pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use pipeline_error::PipelineError;
pub use scan_error::ScanError;
