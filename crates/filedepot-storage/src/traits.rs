//! Storage abstraction trait
//!
//! Defines the contract every blob backend must implement. Writes are
//! whole-object; callers never observe a partial blob.

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob storage abstraction
///
/// The file repository and the thumbnail worker both talk to storage through
/// this trait, so the backend can be swapped without touching either.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist bytes under a fresh unique locator and return it.
    async fn write(&self, data: Vec<u8>) -> StorageResult<String>;

    /// Persist bytes under a caller-chosen key (used for derivative blobs).
    async fn write_at(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Read a blob by its locator.
    async fn read(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Check whether a blob exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;
}
