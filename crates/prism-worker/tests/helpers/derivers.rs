//! Derivers that exercise the pipeline without an image codec.

use bytes::Bytes;
use prism_core::{ChannelVariant, DerivationError};
use prism_processing::ChannelDeriver;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prefixes the source bytes with `"{channel}:"`.
pub struct TaggingDeriver;

impl ChannelDeriver for TaggingDeriver {
    fn derive(&self, channel: ChannelVariant, source: &[u8]) -> Result<Bytes, DerivationError> {
        let mut out = format!("{}:", channel).into_bytes();
        out.extend_from_slice(source);
        Ok(Bytes::from(out))
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn name(&self) -> &'static str {
        "tagging"
    }
}

/// Tags like [`TaggingDeriver`] but rejects one channel.
pub struct FailingChannelDeriver(pub ChannelVariant);

impl ChannelDeriver for FailingChannelDeriver {
    fn derive(&self, channel: ChannelVariant, source: &[u8]) -> Result<Bytes, DerivationError> {
        if channel == self.0 {
            return Err(DerivationError::MalformedInput(format!(
                "cannot derive {}",
                channel
            )));
        }
        TaggingDeriver.derive(channel, source)
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Tags like [`TaggingDeriver`] and counts how often a source is parsed:
/// once per `derive`, once per `derive_all`.
#[derive(Default)]
pub struct CountingDeriver {
    parses: AtomicUsize,
}

impl CountingDeriver {
    pub fn parses(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }
}

impl ChannelDeriver for CountingDeriver {
    fn derive(&self, channel: ChannelVariant, source: &[u8]) -> Result<Bytes, DerivationError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        TaggingDeriver.derive(channel, source)
    }

    fn derive_all(&self, source: &[u8]) -> Vec<(ChannelVariant, Result<Bytes, DerivationError>)> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        ChannelVariant::ALL
            .iter()
            .map(|&channel| (channel, TaggingDeriver.derive(channel, source)))
            .collect()
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}
