//! Invocation entry point: storage notification in, invocation response out.

use serde::Serialize;

use crate::processor::TransformationProcessor;
use prism_core::{BatchReport, EventError, RecordOutcome, UploadEvent, UploadRecord};

const STATUS_OK: u16 = 200;
const STATUS_BAD_REQUEST: u16 = 400;

/// What the invoking runtime gets back from one invocation.
///
/// `batch_item_failures` lists every record the runtime should redeliver:
/// records that failed or partially failed, and records the invocation did not
/// finish in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
    pub batch_item_failures: Vec<UploadRecord>,
    pub outcomes: Vec<RecordOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unfinished: Vec<UploadRecord>,
}

impl InvocationResponse {
    pub fn from_report(report: BatchReport) -> Self {
        let processed: Vec<&str> = report
            .completed
            .iter()
            .filter(|o| o.outcome.is_success())
            .map(|o| o.record.object_key.as_str())
            .collect();
        let body = format!("Processed the following s3Objects: {}", processed.join(", "));

        let batch_item_failures = report
            .completed
            .iter()
            .filter(|o| o.outcome.needs_redelivery())
            .map(|o| o.record.clone())
            .chain(report.unfinished.iter().cloned())
            .collect();

        Self {
            status_code: STATUS_OK,
            body,
            batch_item_failures,
            outcomes: report.completed,
            unfinished: report.unfinished,
        }
    }

    /// Response for a notification that is not a well-formed upload event.
    pub fn malformed(error: &EventError) -> Self {
        Self {
            status_code: STATUS_BAD_REQUEST,
            body: format!("Malformed notification: {}", error),
            batch_item_failures: Vec::new(),
            outcomes: Vec::new(),
            unfinished: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// Run an already parsed event, honouring the configured invocation budget.
pub async fn handle_event(
    processor: &TransformationProcessor,
    event: &UploadEvent,
) -> InvocationResponse {
    let report = match processor.config().invocation_timeout {
        Some(budget) => processor.handle_batch_within(event, budget).await,
        None => BatchReport::from(processor.handle_batch(event).await),
    };
    InvocationResponse::from_report(report)
}

/// Parse a storage notification and run it through the processor.
pub async fn handle_notification(
    processor: &TransformationProcessor,
    notification: &serde_json::Value,
) -> InvocationResponse {
    match UploadEvent::from_notification(notification) {
        Ok(event) => handle_event(processor, &event).await,
        Err(e) => {
            tracing::error!(error = %e, "Rejecting malformed notification");
            InvocationResponse::malformed(&e)
        }
    }
}
