//! Blob storage for uploaded photo files.
//!
//! The relational store only keeps a key; the bytes live behind a
//! [`StorageBackend`]. Deleting a key that does not exist succeeds, so a
//! cascade that failed half-way can simply be retried.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::{AppError, AppResult};

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a new blob. Fails with `Conflict` if the key is already used.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()>;

    /// Read a blob.
    async fn read(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Delete a blob. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Shared handle to the configured storage backend.
pub type SharedStorage = Arc<dyn StorageBackend>;

/// Build the key for a photo uploaded by `user_id` at `timestamp`.
///
/// `attempt` 0 yields `{user}_{ts}.{ext}`; later attempts add a `_{n}` suffix
/// so two uploads in the same second do not overwrite each other.
#[must_use]
pub fn photo_storage_key(user_id: i32, timestamp: i64, extension: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{user_id}_{timestamp}.{extension}")
    } else {
        format!("{user_id}_{timestamp}_{attempt}.{extension}")
    }
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Create the base directory if it is missing.
    pub async fn init(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(AppError::Conflict(format!("Stored file {key} already exists")));
            }
            Err(e) => return Err(AppError::Storage(format!("Failed to create file: {e}"))),
        };

        file.write_all(data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))
    }

    async fn read(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Stored file {key}")))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// In-memory storage backend.
///
/// Used by tests; individual keys can be made to fail on save or delete.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing_saves: Arc<RwLock<HashSet<String>>>,
    failing_deletes: Arc<RwLock<HashSet<String>>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `save` of `key` fail.
    pub async fn fail_save_of(&self, key: &str) {
        self.failing_saves.write().await.insert(key.to_string());
    }

    /// Make every later `delete` of `key` fail.
    pub async fn fail_delete_of(&self, key: &str) {
        self.failing_deletes.write().await.insert(key.to_string());
    }

    /// Clear all injected failures.
    pub async fn heal(&self) {
        self.failing_saves.write().await.clear();
        self.failing_deletes.write().await.clear();
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether no blobs are stored.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()> {
        if self.failing_saves.read().await.contains(key) {
            return Err(AppError::Storage(format!("Injected save failure for {key}")));
        }
        let mut blobs = self.blobs.write().await;
        if blobs.contains_key(key) {
            return Err(AppError::Conflict(format!("Stored file {key} already exists")));
        }
        blobs.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Stored file {key}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if self.failing_deletes.read().await.contains(key) {
            return Err(AppError::Storage(format!(
                "Injected delete failure for {key}"
            )));
        }
        self.blobs.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.blobs.read().await.contains_key(key))
    }
}
