//! Cache and persistence errors.

/// Errors from the snapshot store, the scan lease, and the proxy cache.
///
/// Corrupt persisted state is deliberately *not* represented here: an
/// unreadable or unparseable snapshot is treated as absent and logged,
/// never surfaced as an error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No scan owner signaled completion within the bounded wait.
    #[error("No scan owner completed within {timeout_ms}ms")]
    OwnershipTimeout { timeout_ms: u64 },

    #[error("Cache I/O failed at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Snapshot serialization failed: {message}")]
    Serialize { message: String },

    #[error("Proxy generation failed for {target}: {message}")]
    Generate { target: String, message: String },
}
