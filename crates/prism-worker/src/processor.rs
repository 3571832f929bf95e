//! Transformation processor: fetch, derive three channels, write three objects.
//!
//! Records of a batch are independent. They run concurrently up to the
//! configured fan-out, and within a record the three channel writes are issued
//! together. Nothing here retries: a failed record is reported and left to the
//! notification mechanism's redelivery, which is safe because destination keys
//! depend only on the channel and the source key.

use bytes::Bytes;
use futures::future::join_all;
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use prism_core::{
    BatchReport, BatchResult, ChannelVariant, ChannelWrite, DerivationError, DerivedArtifact,
    ErrorMetadata, FetchError, FetchedObject, LogLevel, ProcessingOutcome, ProcessorConfig,
    RecordOutcome, UploadEvent, UploadRecord,
};
use prism_processing::ChannelDeriver;
use prism_storage::ObjectStore;

pub struct TransformationProcessor {
    config: ProcessorConfig,
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    deriver: Arc<dyn ChannelDeriver>,
}

impl TransformationProcessor {
    /// Build a processor; the configuration is validated once here.
    pub fn new(
        config: ProcessorConfig,
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        deriver: Arc<dyn ChannelDeriver>,
    ) -> Result<Self, anyhow::Error> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            destination,
            deriver,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process every record of `event` and return one outcome per record, in
    /// input order.
    ///
    /// Never fails as a whole: fetch, derivation and write errors are reported
    /// in the record they belong to.
    #[tracing::instrument(
        skip(self, event),
        fields(invocation_id = %Uuid::new_v4(), records = event.len())
    )]
    pub async fn handle_batch(&self, event: &UploadEvent) -> BatchResult {
        let start = Instant::now();
        let records = event.records();

        let mut slots: Vec<Option<ProcessingOutcome>> = vec![None; records.len()];
        let mut outcomes = std::pin::pin!(self.record_outcomes(records));
        while let Some((index, outcome)) = outcomes.next().await {
            slots[index] = Some(outcome);
        }

        let (completed, _) = pair_with_records(records, slots);
        let result = BatchResult::new(completed);
        log_batch_summary(&result.outcomes, 0, start);
        result
    }

    /// Like [`handle_batch`](Self::handle_batch) but stops waiting once
    /// `budget` has elapsed.
    ///
    /// Records still in flight at the deadline are abandoned and returned in
    /// `unfinished` with no outcome. Some of their artifacts may already have
    /// been written; redelivery rewrites them under the same keys.
    #[tracing::instrument(
        skip(self, event),
        fields(invocation_id = %Uuid::new_v4(), records = event.len(), budget_ms = budget.as_millis() as u64)
    )]
    pub async fn handle_batch_within(&self, event: &UploadEvent, budget: Duration) -> BatchReport {
        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + budget;
        let records = event.records();

        let mut slots: Vec<Option<ProcessingOutcome>> = vec![None; records.len()];
        {
            let mut outcomes = std::pin::pin!(self.record_outcomes(records));
            loop {
                match tokio::time::timeout_at(deadline, outcomes.next()).await {
                    Ok(Some((index, outcome))) => slots[index] = Some(outcome),
                    Ok(None) => break,
                    Err(_) => {
                        tracing::warn!(
                            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                            "Invocation budget exhausted, leaving remaining records for redelivery"
                        );
                        break;
                    }
                }
            }
        }

        let (completed, unfinished) = pair_with_records(records, slots);
        log_batch_summary(&completed, unfinished.len(), start);
        BatchReport {
            completed,
            unfinished,
        }
    }

    /// Fetch one object, derive its three channels and write them.
    #[tracing::instrument(
        skip(self, record),
        fields(bucket = %record.source_bucket, key = %record.object_key)
    )]
    pub async fn process_one(&self, record: &UploadRecord) -> ProcessingOutcome {
        let start = Instant::now();

        let bytes = match self
            .source
            .get(&record.source_bucket, &record.object_key)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                log_fetch_failure(&e);
                return ProcessingOutcome::fetch_failed(e);
            }
        };
        let fetched = FetchedObject::new(record, bytes);

        let derived = self.derive_all(&fetched).await;
        let writes = join_all(
            derived
                .into_iter()
                .map(|(channel, result)| self.write_channel(&fetched, channel, result)),
        )
        .await;
        let outcome = ProcessingOutcome::aggregate(writes);

        match &outcome {
            ProcessingOutcome::Success { keys } => tracing::info!(
                size_bytes = fetched.size(),
                artifacts = keys.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Record processed"
            ),
            ProcessingOutcome::PartialFailure { succeeded, failed } => tracing::warn!(
                size_bytes = fetched.size(),
                succeeded = succeeded.len(),
                failed = failed.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Record partially processed"
            ),
            ProcessingOutcome::Failure { .. } => {}
        }

        outcome
    }

    /// Outcomes tagged with their record index, in completion order.
    fn record_outcomes<'a>(
        &'a self,
        records: &'a [UploadRecord],
    ) -> impl Stream<Item = (usize, ProcessingOutcome)> + 'a {
        stream::iter(records.iter().enumerate())
            .map(move |(index, record)| async move { (index, self.process_one(record).await) })
            .buffer_unordered(self.config.max_concurrent_records.max(1))
    }

    async fn write_channel(
        &self,
        fetched: &FetchedObject,
        channel: ChannelVariant,
        derived: Result<Bytes, DerivationError>,
    ) -> ChannelWrite {
        let destination_key = channel.destination_key(&fetched.key);

        let artifact = match derived {
            Ok(bytes) => DerivedArtifact {
                channel,
                destination_key,
                content_type: self.deriver.content_type(),
                bytes,
            },
            Err(e) => {
                tracing::warn!(
                    channel = %channel,
                    destination_key = %destination_key,
                    error = %e,
                    error_code = e.error_code(),
                    "Channel derivation failed"
                );
                return ChannelWrite::failed(channel, destination_key, e);
            }
        };

        match self
            .destination
            .put(
                &self.config.destination_bucket,
                &artifact.destination_key,
                artifact.bytes,
                artifact.content_type,
            )
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    channel = %channel,
                    destination_key = %artifact.destination_key,
                    "Channel artifact written"
                );
                ChannelWrite::succeeded(channel, artifact.destination_key)
            }
            Err(e) => {
                tracing::warn!(
                    channel = %channel,
                    destination_bucket = %self.config.destination_bucket,
                    destination_key = %artifact.destination_key,
                    error = %e,
                    error_code = e.error_code(),
                    recoverable = e.is_recoverable(),
                    "Channel write failed"
                );
                ChannelWrite::failed(channel, artifact.destination_key, e)
            }
        }
    }

    /// Run the deriver off the async workers; decoding can be CPU heavy.
    ///
    /// All three channels are derived in one blocking task so the source is
    /// parsed once per record.
    async fn derive_all(
        &self,
        fetched: &FetchedObject,
    ) -> Vec<(ChannelVariant, Result<Bytes, DerivationError>)> {
        let deriver = self.deriver.clone();
        let source = fetched.bytes.clone();

        match tokio::task::spawn_blocking(move || deriver.derive_all(&source)).await {
            Ok(derived) => derived,
            Err(e) => {
                let cause = DerivationError::MalformedInput(format!("Derivation task failed: {}", e));
                ChannelVariant::ALL
                    .iter()
                    .map(|&channel| (channel, Err(cause.clone())))
                    .collect()
            }
        }
    }
}

fn pair_with_records(
    records: &[UploadRecord],
    slots: Vec<Option<ProcessingOutcome>>,
) -> (Vec<RecordOutcome>, Vec<UploadRecord>) {
    let mut completed = Vec::with_capacity(records.len());
    let mut unfinished = Vec::new();

    for (record, slot) in records.iter().zip(slots) {
        match slot {
            Some(outcome) => completed.push(RecordOutcome {
                record: record.clone(),
                outcome,
            }),
            None => unfinished.push(record.clone()),
        }
    }

    (completed, unfinished)
}

fn log_fetch_failure(err: &FetchError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %err,
            error_code = err.error_code(),
            "Source object fetch failed"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %err,
            error_code = err.error_code(),
            "Source object fetch failed"
        ),
        LogLevel::Error => tracing::error!(
            error = %err,
            error_code = err.error_code(),
            "Source object fetch failed"
        ),
    }
}

fn log_batch_summary(completed: &[RecordOutcome], unfinished: usize, start: Instant) {
    let succeeded = completed.iter().filter(|o| o.outcome.is_success()).count();
    tracing::info!(
        succeeded,
        failed = completed.len() - succeeded,
        unfinished,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Batch processed"
    );
}
