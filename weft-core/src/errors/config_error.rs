//! Configuration errors. All of these are fatal and abort the run before
//! any snapshot commit.

/// Errors raised while loading or merging configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to read config {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Aspect {aspect} declared with two different priorities: {first} vs {second}")]
    PriorityConflict {
        aspect: String,
        first: i32,
        second: i32,
    },
}
