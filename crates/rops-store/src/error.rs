//! Storage backend errors

use std::path::PathBuf;

/// Failure reading or writing persisted tour state
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blob could not be encoded or decoded
    #[error("persisted state is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Blob was written by an incompatible version
    #[error("unsupported persisted state version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Key contains characters the backend cannot store
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Check if the stored blob itself is bad (as opposed to the backend)
    #[inline]
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_) | Self::UnsupportedVersion { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_classification() {
        let err = StorageError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert!(err.is_corruption());
        assert!(err.to_string().contains("version 9"));

        let err = StorageError::InvalidKey("../etc".to_string());
        assert!(!err.is_corruption());
    }
}
