//! Wiring shared by the `prism` binary: configuration in, ready processor out.

use anyhow::Context;
use prism_core::PrismConfig;
use prism_processing::create_deriver;
use prism_storage::create_storage;
use prism_worker::TransformationProcessor;
use std::path::Path;
use std::sync::Arc;

/// Build the processor described by `config`.
///
/// One storage instance serves as both source and destination store.
pub async fn build_processor(config: &PrismConfig) -> anyhow::Result<Arc<TransformationProcessor>> {
    let storage = create_storage(config)
        .await
        .with_context(|| format!("Create {} storage backend", config.storage_backend))?;
    let deriver = create_deriver(config.deriver)?;

    tracing::info!(
        storage_backend = %config.storage_backend,
        deriver = deriver.name(),
        destination_bucket = %config.processor.destination_bucket,
        max_concurrent_records = config.processor.max_concurrent_records,
        "Processor configured"
    );

    let processor =
        TransformationProcessor::new(config.processor.clone(), storage.clone(), storage, deriver)?;
    Ok(Arc::new(processor))
}

/// Read a storage notification document from disk.
pub fn read_notification(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Read notification file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Parse notification file {}", path.display()))
}
