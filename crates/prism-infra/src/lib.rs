//! Prism Infrastructure Library
//!
//! Process-level plumbing shared by Prism binaries. Currently this is the
//! tracing subscriber setup.

pub mod telemetry;

pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
