use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored files (e.g., "public/uploads")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3001/uploads")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Convert storage key to filesystem path.
    ///
    /// Keys are flat file names; anything that could address a path outside
    /// the storage root is rejected.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key '{}' contains invalid characters",
                storage_key
            )));
        }

        Ok(self.base_path.join(storage_key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.url_for(storage_key))
    }

    fn url_for(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().join("uploads"),
            "http://localhost:3001/uploads/".to_string(),
        )
        .await
        .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let (_dir, storage) = test_storage().await;

        let url = storage
            .upload("file-1-000000001.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:3001/uploads/file-1-000000001.png");
        assert_eq!(url, storage.url_for("file-1-000000001.png"));
        assert_eq!(
            std::fs::read(storage.base_path().join("file-1-000000001.png")).unwrap(),
            vec![1, 2, 3]
        );

        // Same key overwrites
        storage
            .upload("file-1-000000001.png", "image/png", vec![4])
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(storage.base_path().join("file-1-000000001.png")).unwrap(),
            vec![4]
        );
    }

    #[tokio::test]
    async fn test_new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public").join("uploads");
        let storage = LocalStorage::new(&root, "/uploads".to_string()).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(storage.url_for("item-1.png"), "/uploads/item-1.png");
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let (_dir, storage) = test_storage().await;
        for key in ["../escape.png", "nested/a.png", "", "..\\a.png"] {
            assert!(matches!(
                storage.upload(key, "image/png", vec![0]).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }
}
