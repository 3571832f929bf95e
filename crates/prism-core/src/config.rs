//! Configuration module
//!
//! `ProcessorConfig` is everything the transformation processor needs and is
//! always passed in explicitly. `PrismConfig` adds the wiring settings (storage
//! backend, deriver, redelivery policy) and is the only place that reads the
//! process environment.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_INVOCATION_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_RECORDS, DEFAULT_MAX_REDELIVERIES,
    DEFAULT_REDELIVERY_BASE_DELAY_MS,
};
use crate::storage_types::StorageBackend;

/// Settings the transformation processor is constructed with.
///
/// Resolved once per process and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub destination_bucket: String,
    /// Upper bound on records processed concurrently within one batch.
    pub max_concurrent_records: usize,
    /// Wall-clock budget for one invocation; `None` means unbounded.
    pub invocation_timeout: Option<Duration>,
}

impl ProcessorConfig {
    pub fn new(destination_bucket: impl Into<String>) -> Self {
        Self {
            destination_bucket: destination_bucket.into(),
            max_concurrent_records: DEFAULT_MAX_CONCURRENT_RECORDS,
            invocation_timeout: Some(Duration::from_secs(DEFAULT_INVOCATION_TIMEOUT_SECS)),
        }
    }

    pub fn with_max_concurrent_records(mut self, limit: usize) -> Self {
        self.max_concurrent_records = limit;
        self
    }

    pub fn with_invocation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.invocation_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.destination_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("Destination bucket must not be empty"));
        }
        if self.max_concurrent_records == 0 {
            return Err(anyhow::anyhow!(
                "PRISM_MAX_CONCURRENT_RECORDS must be at least 1"
            ));
        }
        if self.invocation_timeout == Some(Duration::ZERO) {
            return Err(anyhow::anyhow!(
                "Invocation timeout must be positive; use None for no budget"
            ));
        }
        Ok(())
    }
}

/// Which channel derivation strategy to wire into the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeriverKind {
    /// Decode with an image codec and re-encode each channel as PNG
    Image,
    /// Treat the payload as interleaved 8-bit RGB samples
    Raw,
}

impl FromStr for DeriverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(DeriverKind::Image),
            "raw" => Ok(DeriverKind::Raw),
            _ => Err(anyhow::anyhow!("Invalid deriver: {}", s)),
        }
    }
}

impl Display for DeriverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DeriverKind::Image => write!(f, "image"),
            DeriverKind::Raw => write!(f, "raw"),
        }
    }
}

/// Full configuration of a Prism process.
#[derive(Clone, Debug)]
pub struct PrismConfig {
    pub processor: ProcessorConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    // Derivation
    pub deriver: DeriverKind,
    // Local notification queue
    pub max_redeliveries: u32,
    pub redelivery_base_delay_ms: u64,
}

impl PrismConfig {
    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let destination_bucket = var("PRISM_DESTINATION_BUCKET")
            .ok_or_else(|| anyhow::anyhow!("PRISM_DESTINATION_BUCKET must be set"))?;

        let max_concurrent_records = match var("PRISM_MAX_CONCURRENT_RECORDS") {
            Some(s) => s.parse().map_err(|_| {
                anyhow::anyhow!("PRISM_MAX_CONCURRENT_RECORDS must be a valid number")
            })?,
            None => DEFAULT_MAX_CONCURRENT_RECORDS,
        };

        let timeout_secs: u64 = match var("PRISM_INVOCATION_TIMEOUT_SECS") {
            Some(s) => s.parse().map_err(|_| {
                anyhow::anyhow!("PRISM_INVOCATION_TIMEOUT_SECS must be a valid number")
            })?,
            None => DEFAULT_INVOCATION_TIMEOUT_SECS,
        };
        let invocation_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let storage_backend = match var("PRISM_STORAGE_BACKEND") {
            Some(s) => s.parse()?,
            None => StorageBackend::S3,
        };

        let deriver = match var("PRISM_DERIVER") {
            Some(s) => s.parse()?,
            None => DeriverKind::Image,
        };

        let max_redeliveries = match var("PRISM_MAX_REDELIVERIES") {
            Some(s) => s
                .parse()
                .map_err(|_| anyhow::anyhow!("PRISM_MAX_REDELIVERIES must be a valid number"))?,
            None => DEFAULT_MAX_REDELIVERIES,
        };

        let redelivery_base_delay_ms = match var("PRISM_REDELIVERY_BASE_DELAY_MS") {
            Some(s) => s.parse().map_err(|_| {
                anyhow::anyhow!("PRISM_REDELIVERY_BASE_DELAY_MS must be a valid number")
            })?,
            None => DEFAULT_REDELIVERY_BASE_DELAY_MS,
        };

        let config = PrismConfig {
            processor: ProcessorConfig {
                destination_bucket,
                max_concurrent_records,
                invocation_timeout,
            },
            storage_backend,
            local_storage_path: var("PRISM_LOCAL_STORAGE_PATH"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            deriver,
            max_redeliveries,
            redelivery_base_delay_ms,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.processor.validate()?;

        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "PRISM_LOCAL_STORAGE_PATH must be set when PRISM_STORAGE_BACKEND=local"
            ));
        }

        Ok(())
    }
}
