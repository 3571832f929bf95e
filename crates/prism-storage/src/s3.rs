use crate::keys::{validate_bucket, validate_key};
use crate::traits::{ObjectStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload};
use prism_core::{FetchError, WriteError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// S3 storage implementation
///
/// `object_store` binds a client to a single bucket, so one client is built per
/// bucket on first use and reused afterwards.
#[derive(Clone)]
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: Arc<RwLock<HashMap<String, Arc<AmazonS3>>>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        if region.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "S3 region must not be empty".to_string(),
            ));
        }

        Ok(S3Storage {
            region,
            endpoint_url,
            stores: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    async fn store_for(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        validate_bucket(bucket)?;

        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }
        let store = Arc::new(self.build_store(bucket)?);
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

/// Map an object key to an S3 path verbatim.
///
/// `Path::from` would percent-encode characters such as `%` and collapse empty
/// segments, addressing a different object than the one uploaded. Keys that
/// cannot be represented exactly (e.g. `a//b`) are rejected instead.
fn object_path(key: &str) -> Result<Path, StorageError> {
    validate_key(key)?;
    Path::parse(key)
        .map_err(|e| StorageError::InvalidKey(format!("Key {:?} is not addressable: {}", key, e)))
}

fn fetch_error(key: &str, e: ObjectStoreError) -> FetchError {
    match e {
        ObjectStoreError::NotFound { .. } => FetchError::NotFound(key.to_string()),
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            FetchError::AccessDenied(e.to_string())
        }
        other => FetchError::Transient(other.to_string()),
    }
}

fn write_error(e: ObjectStoreError) -> WriteError {
    match e {
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            WriteError::AccessDenied(e.to_string())
        }
        other => WriteError::Transient(other.to_string()),
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let location = object_path(key).map_err(|e| FetchError::AccessDenied(e.to_string()))?;
        let store = self
            .store_for(bucket)
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let start = std::time::Instant::now();

        let result = store.get(&location).await.map_err(|e| {
            let err = fetch_error(key, e);
            tracing::warn!(
                error = %err,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 get failed"
            );
            err
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get successful"
        );

        Ok(bytes)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), WriteError> {
        let location = object_path(key).map_err(|e| WriteError::AccessDenied(e.to_string()))?;
        let store = self
            .store_for(bucket)
            .await
            .map_err(|e| WriteError::Transient(e.to_string()))?;

        let size = bytes.len();
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        object_store::ObjectStore::put_opts(
            store.as_ref(),
            &location,
            PutPayload::from(bytes),
            options,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            write_error(e)
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_rejected() {
        assert!(matches!(
            S3Storage::new("  ".to_string(), None),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[test]
    fn keys_map_to_paths_verbatim() {
        for key in ["photo..v2.png", "100%.png", "summer holiday/beach.png", "red/a+b.png"] {
            assert_eq!(object_path(key).unwrap().as_ref(), key);
        }
    }

    #[test]
    fn unaddressable_keys_are_rejected() {
        assert!(matches!(
            object_path("albums//cat.png"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            object_path("albums/../cat.png"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn not_found_maps_to_fetch_not_found() {
        let err = ObjectStoreError::NotFound {
            path: "cat.png".to_string(),
            source: "missing".into(),
        };
        assert_eq!(
            fetch_error("cat.png", err),
            FetchError::NotFound("cat.png".to_string())
        );
    }

    #[test]
    fn permission_errors_are_access_denied() {
        let err = ObjectStoreError::PermissionDenied {
            path: "red/cat.png".to_string(),
            source: "forbidden".into(),
        };
        assert!(matches!(write_error(err), WriteError::AccessDenied(_)));
    }

    #[test]
    fn other_errors_are_transient() {
        let err = ObjectStoreError::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        assert!(matches!(write_error(err), WriteError::Transient(_)));
    }
}
