use crate::keys::{validate_bucket, validate_key};
use crate::traits::{ObjectStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use prism_core::{FetchError, WriteError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`. Every bucket is a directory
/// under the same root, so source and destination can share one instance.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one directory per bucket (e.g., "/var/lib/prism")
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

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert `(bucket, key)` to a filesystem path with security validation
    ///
    /// Rejects keys containing path traversal sequences and any path that
    /// resolves outside the base storage directory.
    fn key_to_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_bucket(bucket)?;
        validate_key(key)?;

        let path = self.base_path.join(bucket).join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        } else if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        self.ensure_parent_dir(path).await?;
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }
}

fn fetch_error(key: &str, e: std::io::Error) -> FetchError {
    match e.kind() {
        ErrorKind::NotFound => FetchError::NotFound(key.to_string()),
        ErrorKind::PermissionDenied => FetchError::AccessDenied(format!("{}: {}", key, e)),
        _ => FetchError::Transient(format!("{}: {}", key, e)),
    }
}

fn write_error(key: &str, e: std::io::Error) -> WriteError {
    match e.kind() {
        ErrorKind::PermissionDenied => WriteError::AccessDenied(format!("{}: {}", key, e)),
        _ => WriteError::Transient(format!("{}: {}", key, e)),
    }
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let path = self
            .key_to_path(bucket, key)
            .map_err(|e| FetchError::AccessDenied(e.to_string()))?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| {
            let err = fetch_error(key, e);
            tracing::debug!(
                error = %err,
                path = %path.display(),
                bucket = %bucket,
                key = %key,
                "Local storage read failed"
            );
            err
        })?;

        tracing::debug!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(Bytes::from(data))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), WriteError> {
        let path = self
            .key_to_path(bucket, key)
            .map_err(|e| WriteError::AccessDenied(e.to_string()))?;
        let start = std::time::Instant::now();

        self.write_file(&path, &bytes).await.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path.display(),
                bucket = %bucket,
                key = %key,
                size_bytes = bytes.len(),
                "Local storage write failed"
            );
            write_error(key, e)
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
