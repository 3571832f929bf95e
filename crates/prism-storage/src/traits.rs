//! Object store abstraction trait
//!
//! This module defines the ObjectStore trait that every storage backend implements.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use prism_core::{FetchError, WriteError};
use thiserror::Error;

/// Errors raised while setting up a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage setup
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store abstraction trait
///
/// Used as both the source store (uploads are read from it) and the destination
/// store (derived artifacts are written to it). Implementations must be safe to
/// call concurrently; the processor issues several gets and puts at once.
///
/// There is no multi-key transaction: every `put` lands or fails on its own.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full object at `(bucket, key)`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError>;

    /// Write `bytes` to `(bucket, key)`, replacing any existing object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), WriteError>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
