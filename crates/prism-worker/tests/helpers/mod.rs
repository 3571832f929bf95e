//! Test helpers: build a processor over in-memory stores for integration tests.
//!
//! Run from workspace root: `cargo test -p prism-worker`.

#![allow(dead_code)]

pub mod derivers;
pub mod fixtures;
pub mod storage;

use prism_core::ProcessorConfig;
use prism_processing::ChannelDeriver;
use prism_storage::{InMemoryStorage, ObjectStore};
use prism_worker::TransformationProcessor;
use std::sync::Arc;

pub const SOURCE_BUCKET: &str = "uploads";
pub const DESTINATION_BUCKET: &str = "channels";

/// A processor wired to one shared in-memory store.
pub struct TestPipeline {
    pub storage: Arc<InMemoryStorage>,
    pub processor: Arc<TransformationProcessor>,
}

impl TestPipeline {
    pub fn new() -> Self {
        Self::with_deriver(Arc::new(derivers::TaggingDeriver))
    }

    pub fn with_deriver(deriver: Arc<dyn ChannelDeriver>) -> Self {
        Self::build(ProcessorConfig::new(DESTINATION_BUCKET), deriver)
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        Self::build(config, Arc::new(derivers::TaggingDeriver))
    }

    fn build(config: ProcessorConfig, deriver: Arc<dyn ChannelDeriver>) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let store: Arc<dyn ObjectStore> = storage.clone();
        let processor = TransformationProcessor::new(config, store.clone(), store, deriver)
            .expect("valid processor config");
        Self {
            storage,
            processor: Arc::new(processor),
        }
    }

    /// Seed an upload in the source bucket.
    pub fn upload(&self, key: &str, bytes: impl Into<bytes::Bytes>) {
        self.storage.insert_object(SOURCE_BUCKET, key, bytes);
    }

    pub fn artifact(&self, key: &str) -> Option<bytes::Bytes> {
        self.storage
            .object(DESTINATION_BUCKET, key)
            .map(|object| object.bytes)
    }

    pub fn artifact_keys(&self) -> Vec<String> {
        self.storage.keys(DESTINATION_BUCKET)
    }
}

impl Default for TestPipeline {
    fn default() -> Self {
        Self::new()
    }
}
