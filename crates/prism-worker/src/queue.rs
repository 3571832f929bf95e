//! In-process notification queue: at-least-once delivery with redelivery backoff.
//!
//! Stands in for the storage backend's notification mechanism when Prism runs
//! outside a function runtime. Each delivery runs the handler once; records
//! named in `batchItemFailures` are collected into a new batch and redelivered
//! after an exponential backoff, until they succeed or the redelivery limit is
//! reached. Records whose failures are all unrecoverable are dropped instead of
//! redelivered. The processor itself never retries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use prism_core::constants::{
    DEFAULT_MAX_REDELIVERIES, DEFAULT_REDELIVERY_BASE_DELAY_MS, MAX_REDELIVERY_BACKOFF_SECS,
};
use prism_core::{PrismConfig, UploadEvent, UploadRecord};

use crate::handler::{handle_event, InvocationResponse};
use crate::processor::TransformationProcessor;

/// Multiplier applied to the base delay before the given redelivery (exponential with cap).
#[inline]
pub(crate) fn compute_redelivery_backoff_factor(redelivery: u32) -> u64 {
    2_u64
        .checked_pow(redelivery)
        .unwrap_or(u64::MAX)
        .min(MAX_REDELIVERY_BACKOFF_SECS)
}

#[derive(Clone, Debug)]
pub struct NotificationQueueConfig {
    pub max_redeliveries: u32,
    /// Delay before the first redelivery; later ones double it.
    pub base_delay: Duration,
}

impl Default for NotificationQueueConfig {
    fn default() -> Self {
        Self {
            max_redeliveries: DEFAULT_MAX_REDELIVERIES,
            base_delay: Duration::from_millis(DEFAULT_REDELIVERY_BASE_DELAY_MS),
        }
    }
}

impl From<&PrismConfig> for NotificationQueueConfig {
    fn from(config: &PrismConfig) -> Self {
        Self {
            max_redeliveries: config.max_redeliveries,
            base_delay: Duration::from_millis(config.redelivery_base_delay_ms),
        }
    }
}

impl NotificationQueueConfig {
    pub fn backoff(&self, redelivery: u32) -> Duration {
        let factor = compute_redelivery_backoff_factor(redelivery);
        self.base_delay
            .saturating_mul(u32::try_from(factor).unwrap_or(u32::MAX))
    }
}

/// One invocation of the handler.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAttempt {
    /// 0 for the original delivery, then 1, 2, ... for redeliveries.
    pub attempt: u32,
    pub delivered_at: DateTime<Utc>,
    pub records: usize,
    pub response: InvocationResponse,
}

/// Every delivery made for one notification, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryLog {
    pub attempts: Vec<DeliveryAttempt>,
    /// Records dropped after a failure that redelivery cannot fix.
    pub abandoned: Vec<UploadRecord>,
    /// Records still failing transiently when the redelivery limit was reached.
    pub exhausted: Vec<UploadRecord>,
}

impl DeliveryLog {
    pub fn last_response(&self) -> Option<&InvocationResponse> {
        self.attempts.last().map(|a| &a.response)
    }

    /// Records that never made it through, abandoned first.
    pub fn undelivered(&self) -> Vec<UploadRecord> {
        self.abandoned
            .iter()
            .chain(self.exhausted.iter())
            .cloned()
            .collect()
    }

    /// True when the last delivery was accepted and every record got through.
    pub fn is_fully_delivered(&self) -> bool {
        self.last_response().is_some_and(|r| r.is_ok())
            && self.abandoned.is_empty()
            && self.exhausted.is_empty()
    }

    pub fn redeliveries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }
}

/// Split a response into records worth redelivering and records that would
/// fail the same way again. Unfinished records have no outcome and are always
/// redelivered.
fn partition_failures(response: &InvocationResponse) -> (Vec<UploadRecord>, Vec<UploadRecord>) {
    let mut retry = Vec::new();
    let mut permanent = Vec::new();

    for o in response.outcomes.iter().filter(|o| o.outcome.needs_redelivery()) {
        if o.outcome.is_recoverable() {
            retry.push(o.record.clone());
        } else {
            permanent.push(o.record.clone());
        }
    }
    retry.extend(response.unfinished.iter().cloned());

    (retry, permanent)
}

pub struct NotificationQueue {
    processor: Arc<TransformationProcessor>,
    config: NotificationQueueConfig,
}

impl NotificationQueue {
    pub fn new(processor: Arc<TransformationProcessor>, config: NotificationQueueConfig) -> Self {
        Self { processor, config }
    }

    /// Deliver a raw storage notification.
    ///
    /// A malformed notification is delivered once and rejected; there is
    /// nothing to redeliver.
    pub async fn deliver_notification(&self, notification: &serde_json::Value) -> DeliveryLog {
        match UploadEvent::from_notification(notification) {
            Ok(event) => self.deliver(event).await,
            Err(e) => {
                tracing::error!(error = %e, "Dropping malformed notification");
                DeliveryLog {
                    attempts: vec![DeliveryAttempt {
                        attempt: 0,
                        delivered_at: Utc::now(),
                        records: 0,
                        response: InvocationResponse::malformed(&e),
                    }],
                    ..Default::default()
                }
            }
        }
    }

    /// Deliver `event`, then redeliver its recoverable failures until they
    /// succeed or `max_redeliveries` is used up.
    #[tracing::instrument(skip(self, event), fields(records = event.len()))]
    pub async fn deliver(&self, event: UploadEvent) -> DeliveryLog {
        let mut log = DeliveryLog::default();
        let mut pending = event;

        for attempt in 0..=self.config.max_redeliveries {
            if attempt > 0 {
                let delay = self.config.backoff(attempt - 1);
                tracing::info!(
                    attempt,
                    records = pending.len(),
                    delay_ms = delay.as_millis() as u64,
                    "Redelivering failed records"
                );
                sleep(delay).await;
            }

            let response = handle_event(&self.processor, &pending).await;
            let (retry, permanent) = partition_failures(&response);
            log.attempts.push(DeliveryAttempt {
                attempt,
                delivered_at: Utc::now(),
                records: pending.len(),
                response,
            });

            for record in &permanent {
                tracing::error!(
                    bucket = %record.source_bucket,
                    key = %record.object_key,
                    attempt,
                    "Record failed with unrecoverable error, will not redeliver"
                );
            }
            log.abandoned.extend(permanent);

            if retry.is_empty() {
                return log;
            }
            pending = UploadEvent::new(retry);
        }

        tracing::warn!(
            undelivered = pending.len(),
            max_redeliveries = self.config.max_redeliveries,
            "Redelivery limit reached"
        );
        log.exhausted = pending.into_records();
        log
    }
}
