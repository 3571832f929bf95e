use bytes::Bytes;

use super::channel::ChannelVariant;
use super::event::UploadRecord;

/// Source object held for the duration of one record's processing.
///
/// `Bytes` is reference counted, so every channel derivation reads the same
/// buffer without copying or mutating it.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub source_bucket: String,
    pub key: String,
    pub bytes: Bytes,
}

impl FetchedObject {
    pub fn new(record: &UploadRecord, bytes: Bytes) -> Self {
        Self {
            source_bucket: record.source_bucket.clone(),
            key: record.object_key.clone(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// One channel variant ready to be written to the destination store.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedArtifact {
    pub channel: ChannelVariant,
    pub destination_key: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
}
