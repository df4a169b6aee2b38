//! Scan errors.

/// Errors that can occur while walking roots and collecting declarations.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A non-empty root list resolved to zero existing directories.
    #[error("None of the {configured} configured scan roots exist")]
    MissingRoot { configured: usize },

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid include pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
}
