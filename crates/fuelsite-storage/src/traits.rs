//! Storage abstraction trait

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Backends store whole files under a flat key and report the public URL the
/// file is served from.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key` and return its public URL.
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Public URL for a key, without checking that the file exists.
    fn url_for(&self, storage_key: &str) -> String;
}
