use async_trait::async_trait;
use bytes::Bytes;
use prism_core::{FetchError, StorageBackend, WriteError};
use prism_storage::{InMemoryStorage, ObjectStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wraps an [`InMemoryStorage`] and fails the first `n` gets of chosen keys
/// with a transient error, then behaves normally.
pub struct FlakyStorage {
    inner: Arc<InMemoryStorage>,
    remaining: Mutex<HashMap<String, usize>>,
    gets: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(inner: Arc<InMemoryStorage>) -> Self {
        Self {
            inner,
            remaining: Mutex::new(HashMap::new()),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn fail_first_gets(&self, key: &str, n: usize) {
        self.remaining.lock().unwrap().insert(key.to_string(), n);
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FlakyStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        {
            let mut remaining = self.remaining.lock().unwrap();
            if let Some(n) = remaining.get_mut(key) {
                if *n > 0 {
                    *n -= 1;
                    return Err(FetchError::Transient("connection reset".to_string()));
                }
            }
        }
        self.inner.get(bucket, key).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), WriteError> {
        self.inner.put(bucket, key, bytes, content_type).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

/// Wraps an [`InMemoryStorage`], holds every get open for `hold`, and records
/// the largest number of gets in flight at once.
pub struct GaugeStorage {
    inner: Arc<InMemoryStorage>,
    hold: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugeStorage {
    pub fn new(inner: Arc<InMemoryStorage>, hold: Duration) -> Self {
        Self {
            inner,
            hold,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak_gets(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for GaugeStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        let result = self.inner.get(bucket, key).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), WriteError> {
        self.inner.put(bucket, key, bytes, content_type).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
