//! Error types for scenario loading and snapshot I/O.
//!
//! The per-tick kinetics never fail; degenerate geometry and unknown species
//! are no-ops there. Only the boundaries that read or write files return these.

use thiserror::Error;

/// Problems found while validating a scenario or building species data.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse gradient table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("duplicate species '{0}'")]
    DuplicateSpecies(String),

    #[error("unknown body '{0}'")]
    UnknownBody(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failures while saving or loading a simulation snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}
