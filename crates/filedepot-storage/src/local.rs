//! Local filesystem storage backend.

use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage rooted at a configured directory, created on
/// demand at construction.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(storage_key))
    }

    async fn write_path(&self, path: &Path, data: Vec<u8>) -> StorageResult<()> {
        let size = data.len();
        let start = std::time::Instant::now();

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob written"
        );

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn write(&self, data: Vec<u8>) -> StorageResult<String> {
        let key = keys::new_key();
        let path = self.key_to_path(&key)?;
        self.write_path(&path, data).await?;
        Ok(key)
    }

    async fn write_at(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        self.write_path(&path, data).await
    }

    async fn read(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(data)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (_dir, storage) = storage().await;
        let key = storage.write(b"hello world".to_vec()).await.unwrap();
        let data = storage.read(&key).await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn test_write_generates_distinct_keys() {
        let (_dir, storage) = storage().await;
        let a = storage.write(b"a".to_vec()).await.unwrap();
        let b = storage.write(b"b".to_vec()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(storage.read(&a).await.unwrap(), b"a");
        assert_eq!(storage.read(&b).await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_write_at_derivative_key() {
        let (_dir, storage) = storage().await;
        let key = storage.write(b"original".to_vec()).await.unwrap();
        let thumb_key = crate::keys::derivative_key(&key, 100);
        storage
            .write_at(&thumb_key, b"thumb".to_vec())
            .await
            .unwrap();
        assert!(storage.exists(&thumb_key).await.unwrap());
        assert_eq!(storage.read(&thumb_key).await.unwrap(), b"thumb");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_dir, storage) = storage().await;
        match storage.read("no-such-key").await {
            Err(StorageError::NotFound(key)) => assert_eq!(key, "no-such-key"),
            other => panic!("Expected NotFound, got {:?}", other.map(|_| ())),
        }
        assert!(!storage.exists("no-such-key").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let (_dir, storage) = storage().await;
        for key in ["../etc/passwd", "/abs", "a/b", ""] {
            assert!(matches!(
                storage.read(key).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("files_manager");
        let storage = LocalStorage::new(&nested).await.unwrap();
        let key = storage.write(b"x".to_vec()).await.unwrap();
        assert!(nested.join(&key).exists());
    }
}
