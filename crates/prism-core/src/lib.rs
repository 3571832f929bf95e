//! Prism Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration shared
//! by every Prism component: upload events, channel variants, per-record outcomes
//! and the settings the transformation processor is constructed with.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{DeriverKind, PrismConfig, ProcessorConfig};
pub use error::{
    ChannelError, DerivationError, ErrorMetadata, EventError, FetchError, LogLevel, WriteError,
};
pub use models::{
    BatchReport, BatchResult, ChannelFailure, ChannelVariant, ChannelWrite, DerivedArtifact,
    FetchedObject, OutcomeKind, ProcessingOutcome, RecordOutcome, UploadEvent, UploadRecord,
};
pub use storage_types::StorageBackend;
