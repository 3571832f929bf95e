pub mod artifact;
pub mod channel;
pub mod event;
pub mod outcome;

pub use artifact::{DerivedArtifact, FetchedObject};
pub use channel::ChannelVariant;
pub use event::{UploadEvent, UploadRecord};
pub use outcome::{
    BatchReport, BatchResult, ChannelFailure, ChannelWrite, OutcomeKind, ProcessingOutcome,
    RecordOutcome,
};
