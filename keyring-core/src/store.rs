//! Persistence boundary for [`KeyringState`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::state::KeyringState;

/// Result type for state store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while loading or saving keyring state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("state store io error ({context}): {source}")]
    Io {
        /// Operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Stored state could not be (de)serialized.
    #[error("state store serialization error: {0}")]
    Serialization(String),
    /// Backend-specific failure.
    #[error("state store error: {0}")]
    Backend(String),
}

impl StoreError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Durable storage for the keyring aggregate.
///
/// A successful `save` means the state is durable; the keyring only commits
/// a mutation after `save` returns `Ok`.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the last saved state, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state exists but cannot be read.
    async fn load(&self) -> StoreResult<Option<KeyringState>>;

    /// Replaces the stored state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state could not be durably written.
    async fn save(&self, state: &KeyringState) -> StoreResult<()>;
}

/// JSON file store with atomic replace semantics.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store writing to `path`. Parent directories are created on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> StoreResult<Option<KeyringState>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io("read state", err)),
        };
        let state = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &KeyringState) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io("create state directory", e))?;
        }
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // write-then-rename so a crash never leaves a truncated state file
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| StoreError::io("write temp state", e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StoreError::io("replace state", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("nested").join("state.json"));

        let mut state = KeyringState::default();
        store.save(&state).await.unwrap();
        state.use_sync_approvals = true;
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.use_sync_approvals);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupted_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = FileStateStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
