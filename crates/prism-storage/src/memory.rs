//! In-memory object store
//!
//! Keeps objects in a map keyed by `(bucket, key)`. Besides serving as a
//! backend for dry runs, it supports fault injection and counts every get and
//! put attempt so callers can observe exactly which operations were issued.

use crate::traits::ObjectStore;
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use prism_core::{FetchError, WriteError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

type ObjectId = (String, String);

fn object_id(bucket: &str, key: &str) -> ObjectId {
    (bucket.to_string(), key.to_string())
}

/// A stored object together with the content type it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Default)]
struct Faults {
    get: HashMap<ObjectId, FetchError>,
    put: HashMap<ObjectId, WriteError>,
    get_delay: HashMap<ObjectId, Duration>,
}

/// Object store held entirely in memory
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<ObjectId, StoredObject>>,
    faults: Mutex<Faults>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

// A poisoned lock only means another caller panicked mid-operation; the map
// itself is still consistent because every critical section is a single call.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, bypassing the put counter.
    pub fn insert_object(&self, bucket: &str, key: &str, bytes: impl Into<Bytes>) {
        lock(&self.objects).insert(
            object_id(bucket, key),
            StoredObject {
                bytes: bytes.into(),
                content_type: prism_core::constants::DEFAULT_ARTIFACT_CONTENT_TYPE.to_string(),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(&object_id(bucket, key)).cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        lock(&self.objects).contains_key(&object_id(bucket, key))
    }

    /// Keys present in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Make every get of `(bucket, key)` fail with `error`.
    pub fn fail_get(&self, bucket: &str, key: &str, error: FetchError) {
        lock(&self.faults).get.insert(object_id(bucket, key), error);
    }

    /// Make every put of `(bucket, key)` fail with `error`.
    pub fn fail_put(&self, bucket: &str, key: &str, error: WriteError) {
        lock(&self.faults).put.insert(object_id(bucket, key), error);
    }

    /// Delay every get of `(bucket, key)` by `delay`.
    pub fn delay_get(&self, bucket: &str, key: &str, delay: Duration) {
        lock(&self.faults)
            .get_delay
            .insert(object_id(bucket, key), delay);
    }

    pub fn clear_faults(&self) {
        *lock(&self.faults) = Faults::default();
    }

    /// Number of get attempts, including failed ones.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of put attempts, including failed ones.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let id = object_id(bucket, key);

        let (fault, delay) = {
            let faults = lock(&self.faults);
            (faults.get.get(&id).cloned(), faults.get_delay.get(&id).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = fault {
            return Err(err);
        }

        lock(&self.objects)
            .get(&id)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| FetchError::NotFound(key.to_string()))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), WriteError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let id = object_id(bucket, key);

        if let Some(err) = lock(&self.faults).put.get(&id).cloned() {
            return Err(err);
        }

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            "In-memory put"
        );

        lock(&self.objects).insert(
            id,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
