use crate::traits::ChannelDeriver;
use bytes::Bytes;
use prism_core::constants::DEFAULT_ARTIFACT_CONTENT_TYPE;
use prism_core::{ChannelVariant, DerivationError};

/// Codec-free splitter for interleaved 8-bit RGB samples.
///
/// The payload is read as `R G B R G B ...`; every triplet keeps the sample of
/// the requested channel and has the other two zeroed. A payload whose length
/// is not a multiple of three is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPlaneSplitter;

impl RawPlaneSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl ChannelDeriver for RawPlaneSplitter {
    fn derive(&self, channel: ChannelVariant, source: &[u8]) -> Result<Bytes, DerivationError> {
        if source.len() % 3 != 0 {
            return Err(DerivationError::MalformedInput(format!(
                "Interleaved RGB payload of {} bytes is not a whole number of pixels",
                source.len()
            )));
        }

        let keep = channel.sample_index();
        let out: Vec<u8> = source
            .iter()
            .enumerate()
            .map(|(i, &sample)| if i % 3 == keep { sample } else { 0 })
            .collect();

        Ok(Bytes::from(out))
    }

    fn content_type(&self) -> &'static str {
        DEFAULT_ARTIFACT_CONTENT_TYPE
    }

    fn name(&self) -> &'static str {
        "raw"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolates_each_plane() {
        let source = [1u8, 2, 3, 4, 5, 6];
        let splitter = RawPlaneSplitter::new();

        assert_eq!(
            &splitter.derive(ChannelVariant::Red, &source).unwrap()[..],
            &[1, 0, 0, 4, 0, 0]
        );
        assert_eq!(
            &splitter.derive(ChannelVariant::Green, &source).unwrap()[..],
            &[0, 2, 0, 0, 5, 0]
        );
        assert_eq!(
            &splitter.derive(ChannelVariant::Blue, &source).unwrap()[..],
            &[0, 0, 3, 0, 0, 6]
        );
    }

    #[test]
    fn source_is_left_untouched() {
        let source = vec![9u8; 9];
        let before = source.clone();
        RawPlaneSplitter.derive(ChannelVariant::Green, &source).unwrap();
        assert_eq!(source, before);
    }

    #[test]
    fn partial_pixel_is_malformed() {
        let err = RawPlaneSplitter
            .derive(ChannelVariant::Red, &[0u8; 10])
            .unwrap_err();
        assert!(matches!(err, DerivationError::MalformedInput(_)));
    }
}
