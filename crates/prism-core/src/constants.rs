//! Defaults shared by configuration, the processor and the notification queue.

/// Records of one batch processed at the same time.
pub const DEFAULT_MAX_CONCURRENT_RECORDS: usize = 4;

/// Wall-clock budget for one invocation. 0 disables the budget.
pub const DEFAULT_INVOCATION_TIMEOUT_SECS: u64 = 60;

/// How many times the local notification queue redelivers a failed record.
pub const DEFAULT_MAX_REDELIVERIES: u32 = 3;

/// Base delay for redelivery backoff, in milliseconds.
pub const DEFAULT_REDELIVERY_BASE_DELAY_MS: u64 = 1000;

/// Upper bound on a single redelivery backoff, in seconds.
pub const MAX_REDELIVERY_BACKOFF_SECS: u64 = 300;

/// Notification event names that announce a new object start with this prefix.
pub const OBJECT_CREATED_EVENT_PREFIX: &str = "ObjectCreated";

/// Content type used when a deriver cannot name a more specific one.
pub const DEFAULT_ARTIFACT_CONTENT_TYPE: &str = "application/octet-stream";
