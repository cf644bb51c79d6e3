//! Persisted tour position
//!
//! Only four fields survive a reload: demo mode, the step index, the guided
//! tour flag and the pause flag. Injected data collections are memory-only,
//! so a reload resumes the tour position with empty collections.
//!
//! The blob is JSON wrapped in a version envelope:
//!
//! ```json
//! {"state":{"isDemoMode":true,"currentStep":3,"isGuidedTour":true,"isPaused":false},"version":1}
//! ```

use crate::error::StorageError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default storage key for the demo state blob
pub const DEFAULT_STORAGE_KEY: &str = "research-ops-demo-state";

/// Current envelope version
pub const PERSIST_VERSION: u32 = 1;

/// Subset of demo state that survives a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub is_demo_mode: bool,
    pub current_step: usize,
    pub is_guided_tour: bool,
    pub is_paused: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: PersistedState,
    version: u32,
}

impl PersistedState {
    /// Encode into the versioned JSON blob
    ///
    /// # Errors
    /// `StorageError::Malformed` if serialization fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        let envelope = Envelope {
            state: *self,
            version: PERSIST_VERSION,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Decode a versioned JSON blob
    ///
    /// # Errors
    /// - `StorageError::Malformed` for invalid JSON or missing fields
    /// - `StorageError::UnsupportedVersion` for a different envelope version
    pub fn decode(blob: &str) -> Result<Self, StorageError> {
        let envelope: Envelope = serde_json::from_str(blob)?;
        if envelope.version != PERSIST_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: envelope.version,
                expected: PERSIST_VERSION,
            });
        }
        Ok(envelope.state)
    }
}

/// Durable key-value backend for persisted state
pub trait StateStorage: Send + Sync + fmt::Debug {
    /// Read the blob stored under `key`
    ///
    /// # Errors
    /// Backend failures; a missing key is `Ok(None)`.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`
    ///
    /// # Errors
    /// Backend failures.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the blob stored under `key`; missing keys are not an error
    ///
    /// # Errors
    /// Backend failures.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, lost on drop
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with one blob
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.entries.lock().insert(key.into(), value.into());
        storage
    }

    /// Raw blob for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `root`; the directory is created on first save
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl StateStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;

        // write-then-rename so a crash never leaves a torn blob
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(io_error(&tmp))?;
        std::fs::rename(&tmp, &path).map_err(io_error(&path))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }
}
