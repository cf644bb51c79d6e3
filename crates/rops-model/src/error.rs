//! Error types for tour tables

use std::path::PathBuf;

/// Errors raised while building or loading a step table
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A table must contain at least one step
    #[error("step table is empty")]
    EmptyTable,

    /// Two steps share an id
    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    /// Unknown built-in table name
    #[error("unknown step table: {0} (expected `basic` or `enterprise`)")]
    UnknownTable(String),

    /// YAML tour file could not be parsed
    #[error("invalid YAML tour: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON tour file could not be parsed
    #[error("invalid JSON tour: {0}")]
    Json(#[from] serde_json::Error),

    /// Tour file could not be read
    #[error("failed to read tour file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
