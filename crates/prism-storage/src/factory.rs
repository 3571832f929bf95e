#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{InMemoryStorage, ObjectStore, StorageBackend, StorageError, StorageResult};
use prism_core::PrismConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
///
/// The same instance serves as source and destination store.
pub async fn create_storage(config: &PrismConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let storage = S3Storage::new(region, config.s3_endpoint.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("PRISM_LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => Ok(Arc::new(InMemoryStorage::new())),
    }
}
