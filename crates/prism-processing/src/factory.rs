use crate::{ChannelDeriver, RawPlaneSplitter};
use prism_core::DeriverKind;
use std::sync::Arc;

/// Create the channel deriver selected by configuration
pub fn create_deriver(kind: DeriverKind) -> Result<Arc<dyn ChannelDeriver>, anyhow::Error> {
    match kind {
        #[cfg(feature = "image")]
        DeriverKind::Image => Ok(Arc::new(crate::ImageChannelSplitter::new())),

        #[cfg(not(feature = "image"))]
        DeriverKind::Image => Err(anyhow::anyhow!(
            "Image deriver not available (image feature not enabled)"
        )),

        DeriverKind::Raw => Ok(Arc::new(RawPlaneSplitter::new())),
    }
}
