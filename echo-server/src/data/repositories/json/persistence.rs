use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::store::Snapshot;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("failed to read data file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write data file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data file {path} is not a valid snapshot: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("simulated storage failure")]
    Unavailable,
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        DomainError::Unexpected(err.to_string())
    }
}

/// Write-through sink for the store. `save` runs before a write becomes visible.
#[async_trait]
pub(crate) trait Persistence: Send + Sync {
    async fn load(&self) -> Result<Option<Snapshot>, StorageError>;
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub(crate) struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Persistence for JsonFilePersistence {
    async fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let snapshot = serde_json::from_slice(&raw).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec_pretty(snapshot).map_err(StorageError::Encode)?;
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        // rename поверх старого файла, чтобы не оставить его наполовину записанным
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &encoded)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(write_err)?;

        debug!(path = %self.path.display(), bytes = encoded.len(), "snapshot saved");
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory; nothing survives a restart.
#[derive(Debug, Default)]
pub(crate) struct MemoryPersistence {
    saved: Mutex<Option<Snapshot>>,
    fail_saves: AtomicBool,
}

impl MemoryPersistence {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn last_saved(&self) -> Option<Snapshot> {
        self.saved.lock().expect("saved mutex poisoned").clone()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        Ok(self
            .saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        *self
            .saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(snapshot.clone());
        Ok(())
    }
}
