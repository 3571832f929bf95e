//! Telemetry initialization
//!
//! Installs the global tracing subscriber. Output is human readable by default
//! and newline-delimited JSON when the function runtime ingests structured logs.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
