//! Upload events and their storage notification wire format.
//!
//! The notification mechanism delivers JSON shaped like
//! `{"Records":[{"eventName":"ObjectCreated:Put","s3":{"bucket":{"name":".."},"object":{"key":".."}}}]}`.
//! Object keys arrive URL-encoded with `+` standing for a space.

use serde::{Deserialize, Serialize};

use crate::constants::OBJECT_CREATED_EVENT_PREFIX;
use crate::error::EventError;

/// Identifies one uploaded object.
///
/// The same key may appear more than once in a batch (rapid re-uploads); each
/// occurrence is processed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "bucket")]
    pub source_bucket: String,
    #[serde(rename = "key")]
    pub object_key: String,
}

impl UploadRecord {
    pub fn new(source_bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            object_key: object_key.into(),
        }
    }
}

/// The ordered records delivered to a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadEvent {
    records: Vec<UploadRecord>,
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records")]
    records: Option<Vec<NotificationRecord>>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: Option<BucketEntity>,
    object: Option<ObjectEntity>,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: Option<String>,
}

impl UploadEvent {
    pub fn new(records: Vec<UploadRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<UploadRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse a storage notification document.
    pub fn from_json_str(json: &str) -> Result<Self, EventError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| EventError::InvalidJson(e.to_string()))?;
        Self::from_notification(&value)
    }

    /// Build an event from an already decoded notification.
    ///
    /// Records announcing anything other than object creation are dropped.
    /// A creation record without a bucket name or object key makes the whole
    /// notification malformed.
    pub fn from_notification(value: &serde_json::Value) -> Result<Self, EventError> {
        let notification: Notification = serde_json::from_value(value.clone())
            .map_err(|e| EventError::InvalidJson(e.to_string()))?;
        let raw_records = notification.records.ok_or(EventError::MissingRecords)?;

        let mut records = Vec::with_capacity(raw_records.len());
        for (index, raw) in raw_records.into_iter().enumerate() {
            if let Some(name) = raw.event_name.as_deref() {
                if !name.starts_with(OBJECT_CREATED_EVENT_PREFIX) {
                    continue;
                }
            }

            let s3 = raw.s3.ok_or(EventError::MissingField { index, field: "s3" })?;
            let bucket = s3
                .bucket
                .and_then(|b| b.name)
                .filter(|name| !name.is_empty())
                .ok_or(EventError::MissingField {
                    index,
                    field: "s3.bucket.name",
                })?;
            let raw_key = s3
                .object
                .and_then(|o| o.key)
                .filter(|key| !key.is_empty())
                .ok_or(EventError::MissingField {
                    index,
                    field: "s3.object.key",
                })?;

            let key = decode_object_key(&raw_key)
                .ok_or_else(|| EventError::InvalidKey { index, key: raw_key.clone() })?;
            records.push(UploadRecord::new(bucket, key));
        }

        Ok(Self { records })
    }
}

impl From<Vec<UploadRecord>> for UploadEvent {
    fn from(records: Vec<UploadRecord>) -> Self {
        Self::new(records)
    }
}

/// Undo the form encoding applied to keys in notifications.
fn decode_object_key(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|key| key.into_owned())
}
