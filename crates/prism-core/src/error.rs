//! Error types module
//!
//! The pipeline distinguishes three stages that can fail independently:
//! fetching the source object, deriving a channel variant, and writing that
//! variant. Each stage has its own error enum so an outcome can state exactly
//! where a record stopped. `EventError` covers notifications that cannot be
//! turned into an `UploadEvent` at all.

use serde::Serialize;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected conditions, e.g. an object deleted before it was processed
    Debug,
    /// Recoverable issues that redelivery is likely to fix
    Warn,
    /// Failures that need an operator
    Error,
}

/// Metadata describing how an error should be reported upstream.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FETCH_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether a redelivery of the same record can succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure to read the uploaded object from the source store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FetchError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Transient fetch error: {0}")]
    Transient(String),
}

impl ErrorMetadata for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "FETCH_NOT_FOUND",
            FetchError::AccessDenied(_) => "FETCH_ACCESS_DENIED",
            FetchError::Transient(_) => "FETCH_TRANSIENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            FetchError::NotFound(_) => LogLevel::Debug,
            FetchError::AccessDenied(_) => LogLevel::Error,
            FetchError::Transient(_) => LogLevel::Warn,
        }
    }
}

/// Failure to compute one channel variant from the fetched bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DerivationError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl ErrorMetadata for DerivationError {
    fn error_code(&self) -> &'static str {
        "DERIVATION_MALFORMED_INPUT"
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}

/// Failure to store one derived artifact in the destination store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum WriteError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Transient write error: {0}")]
    Transient(String),
}

impl ErrorMetadata for WriteError {
    fn error_code(&self) -> &'static str {
        match self {
            WriteError::AccessDenied(_) => "WRITE_ACCESS_DENIED",
            WriteError::Transient(_) => "WRITE_TRANSIENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, WriteError::Transient(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            WriteError::AccessDenied(_) => LogLevel::Error,
            WriteError::Transient(_) => LogLevel::Warn,
        }
    }
}

/// Why a single channel of a record did not land in the destination store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "stage", content = "error", rename_all = "snake_case")]
pub enum ChannelError {
    #[error("Derivation failed: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Write failed: {0}")]
    Write(#[from] WriteError),
}

impl ErrorMetadata for ChannelError {
    fn error_code(&self) -> &'static str {
        match self {
            ChannelError::Derivation(e) => e.error_code(),
            ChannelError::Write(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ChannelError::Derivation(e) => e.is_recoverable(),
            ChannelError::Write(e) => e.is_recoverable(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ChannelError::Derivation(e) => e.log_level(),
            ChannelError::Write(e) => e.log_level(),
        }
    }
}

/// A storage notification that does not describe a well-formed upload event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("Invalid notification JSON: {0}")]
    InvalidJson(String),

    #[error("Notification has no Records array")]
    MissingRecords,

    #[error("Record {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("Record {index} has an undecodable object key: {key}")]
    InvalidKey { index: usize, key: String },
}
