use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the meter tracker.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A ledger file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A user-supplied field failed validation before reaching the store.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No service with the given id exists in the ledger.
    #[error("Unknown service: {0}")]
    UnknownService(u64),

    /// No measurement with the given id exists in the ledger.
    #[error("Unknown measurement: {0}")]
    UnknownMeasurement(u64),

    /// A service with this name is already registered.
    #[error("Service already exists: {0}")]
    DuplicateService(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackerError {
    /// Shorthand for building a [`TrackerError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        TrackerError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the tracker crates.
pub type Result<T> = std::result::Result<T, TrackerError>;
