//! Prism Storage Library
//!
//! This crate provides the object store port the transformation processor reads
//! source objects from and writes derived artifacts to, plus its backends:
//! S3 (via `object_store`), the local filesystem and an in-memory store.
//!
//! # Addressing
//!
//! Objects are addressed by `(bucket, key)`. Keys must not contain `..` or a
//! leading `/`; validation is shared through the `keys` module so all backends
//! reject the same keys.
//!
//! Every backend maps its native failures onto the record-level taxonomy
//! (`FetchError` for reads, `WriteError` for writes). `StorageError` is only
//! returned while constructing a backend.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::InMemoryStorage;
pub use prism_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectStore, StorageError, StorageResult};
