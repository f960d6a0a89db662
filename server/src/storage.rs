//! Durable object storage seam for synthesized audio.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AudioStorage: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Local-filesystem storage under a fixed data root.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Object paths must stay inside the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(path);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || rel.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl AudioStorage for DiskStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage used by the test harness.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioStorage for MemoryStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.objects
            .lock()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects.lock().await.remove(path);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.lock().await.get(path).cloned())
    }
}
