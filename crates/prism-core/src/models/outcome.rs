//! Per-record and per-batch processing outcomes.

use serde::Serialize;

use super::channel::ChannelVariant;
use super::event::UploadRecord;
use crate::error::{ChannelError, ErrorMetadata, FetchError};

/// Coarse classification of a [`ProcessingOutcome`], handy for logging and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    PartialFailure,
    Failure,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "SUCCESS",
            OutcomeKind::PartialFailure => "PARTIAL_FAILURE",
            OutcomeKind::Failure => "FAILURE",
        }
    }
}

/// Result of attempting one channel of one record: derivation followed by write.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelWrite {
    pub channel: ChannelVariant,
    pub destination_key: String,
    pub result: Result<(), ChannelError>,
}

impl ChannelWrite {
    pub fn succeeded(channel: ChannelVariant, destination_key: impl Into<String>) -> Self {
        Self {
            channel,
            destination_key: destination_key.into(),
            result: Ok(()),
        }
    }

    pub fn failed(
        channel: ChannelVariant,
        destination_key: impl Into<String>,
        cause: impl Into<ChannelError>,
    ) -> Self {
        Self {
            channel,
            destination_key: destination_key.into(),
            result: Err(cause.into()),
        }
    }
}

/// A channel whose artifact did not land, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelFailure {
    pub channel: ChannelVariant,
    pub destination_key: String,
    pub cause: ChannelError,
}

/// Outcome of processing a single upload record.
///
/// A record that was fetched but had every write fail is still a
/// `PartialFailure` (with nothing in `succeeded`), which keeps destination-side
/// faults distinguishable from source-side ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingOutcome {
    /// All three artifacts were written, keys in RED, GREEN, BLUE order.
    Success { keys: Vec<String> },
    PartialFailure {
        succeeded: Vec<String>,
        failed: Vec<ChannelFailure>,
    },
    /// The source object could not be fetched; no writes were attempted.
    Failure { cause: FetchError },
}

impl ProcessingOutcome {
    /// Fold the per-channel attempts of one record into its outcome.
    ///
    /// Attempts are reported in the order given, which the processor keeps as
    /// RED, GREEN, BLUE.
    pub fn aggregate(writes: Vec<ChannelWrite>) -> Self {
        let mut succeeded = Vec::with_capacity(writes.len());
        let mut failed = Vec::new();

        for write in writes {
            match write.result {
                Ok(()) => succeeded.push(write.destination_key),
                Err(cause) => failed.push(ChannelFailure {
                    channel: write.channel,
                    destination_key: write.destination_key,
                    cause,
                }),
            }
        }

        if failed.is_empty() {
            ProcessingOutcome::Success { keys: succeeded }
        } else {
            ProcessingOutcome::PartialFailure { succeeded, failed }
        }
    }

    pub fn fetch_failed(cause: FetchError) -> Self {
        ProcessingOutcome::Failure { cause }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            ProcessingOutcome::Success { .. } => OutcomeKind::Success,
            ProcessingOutcome::PartialFailure { .. } => OutcomeKind::PartialFailure,
            ProcessingOutcome::Failure { .. } => OutcomeKind::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }

    /// Destination keys known to be present after this attempt.
    pub fn written_keys(&self) -> &[String] {
        match self {
            ProcessingOutcome::Success { keys } => keys,
            ProcessingOutcome::PartialFailure { succeeded, .. } => succeeded,
            ProcessingOutcome::Failure { .. } => &[],
        }
    }

    /// Whether the invoking runtime should hand this record back for redelivery.
    pub fn needs_redelivery(&self) -> bool {
        !self.is_success()
    }

    /// Whether redelivering the record can change this outcome.
    ///
    /// True when at least one cause is transient. A record whose failures are all
    /// permanent (missing object, denied access, undecodable payload) would fail
    /// the same way again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ProcessingOutcome::Success { .. } => false,
            ProcessingOutcome::PartialFailure { failed, .. } => {
                failed.iter().any(|f| f.cause.is_recoverable())
            }
            ProcessingOutcome::Failure { cause } => cause.is_recoverable(),
        }
    }
}

/// A processing outcome paired with the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub record: UploadRecord,
    #[serde(flatten)]
    pub outcome: ProcessingOutcome,
}

/// One outcome per input record, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    pub fn new(outcomes: Vec<RecordOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordOutcome> {
        self.outcomes.iter()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.kind() == kind)
            .count()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a RecordOutcome;
    type IntoIter = std::slice::Iter<'a, RecordOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

/// What a time-bounded batch managed to do.
///
/// `completed` holds outcomes for finished records in input order. Records in
/// `unfinished` have no outcome at all and are left for redelivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub completed: Vec<RecordOutcome>,
    pub unfinished: Vec<UploadRecord>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.unfinished.is_empty()
    }

    /// Converts into a [`BatchResult`] when every record finished.
    pub fn into_result(self) -> Option<BatchResult> {
        if self.is_complete() {
            Some(BatchResult::new(self.completed))
        } else {
            None
        }
    }
}

impl From<BatchResult> for BatchReport {
    fn from(result: BatchResult) -> Self {
        Self {
            completed: result.outcomes,
            unfinished: Vec::new(),
        }
    }
}
