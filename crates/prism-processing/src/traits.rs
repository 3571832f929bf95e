use bytes::Bytes;
use prism_core::{ChannelVariant, DerivationError};

/// Derives one colour channel's artifact from a source payload.
///
/// Implementations must be pure: the same channel and source bytes always give
/// an equivalent result, nothing outside the return value is touched, and the
/// source slice is only read.
pub trait ChannelDeriver: Send + Sync {
    fn derive(&self, channel: ChannelVariant, source: &[u8]) -> Result<Bytes, DerivationError>;

    /// Derive every channel of one source, in [`ChannelVariant::ALL`] order.
    ///
    /// Each channel keeps its own result. Override when the source can be
    /// parsed once and shared across channels.
    fn derive_all(&self, source: &[u8]) -> Vec<(ChannelVariant, Result<Bytes, DerivationError>)> {
        ChannelVariant::ALL
            .iter()
            .map(|&channel| (channel, self.derive(channel, source)))
            .collect()
    }

    /// Content type of every payload this deriver produces.
    fn content_type(&self) -> &'static str;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
