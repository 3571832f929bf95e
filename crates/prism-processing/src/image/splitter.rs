//! Image channel splitter - isolates one colour plane of a decoded image

use crate::traits::ChannelDeriver;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader};
use prism_core::{ChannelVariant, DerivationError};
use std::io::Cursor;

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Keeps one colour channel of the source image and zeroes the other two.
///
/// Accepts any format the `image` crate can sniff. The output is always PNG,
/// has the source dimensions, and keeps the alpha channel when the source has
/// one. Encoding is lossless, so identical input yields identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageChannelSplitter;

impl ImageChannelSplitter {
    pub fn new() -> Self {
        Self
    }

    fn decode(source: &[u8]) -> Result<DynamicImage, DerivationError> {
        let cursor = Cursor::new(source);
        ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| DerivationError::MalformedInput(format!("Unreadable image: {}", e)))?
            .decode()
            .map_err(|e| DerivationError::MalformedInput(format!("Undecodable image: {}", e)))
    }

    fn encode(
        img: &DynamicImage,
        channel: ChannelVariant,
        size_hint: usize,
    ) -> Result<Bytes, DerivationError> {
        tracing::debug!(
            channel = %channel,
            width = img.width(),
            height = img.height(),
            has_alpha = img.color().has_alpha(),
            "Isolating channel"
        );
        let isolated = Self::isolate(img, channel);

        let mut buffer = Vec::with_capacity(size_hint);
        let mut cursor = Cursor::new(&mut buffer);
        isolated
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| DerivationError::MalformedInput(format!("PNG encoding failed: {}", e)))?;

        Ok(Bytes::from(buffer))
    }

    fn isolate(img: &DynamicImage, channel: ChannelVariant) -> DynamicImage {
        let keep = channel.sample_index();

        if img.color().has_alpha() {
            let mut rgba = img.to_rgba8();
            for pixel in rgba.pixels_mut() {
                for (i, sample) in pixel.0.iter_mut().take(3).enumerate() {
                    if i != keep {
                        *sample = 0;
                    }
                }
            }
            DynamicImage::ImageRgba8(rgba)
        } else {
            let mut rgb = img.to_rgb8();
            for pixel in rgb.pixels_mut() {
                for (i, sample) in pixel.0.iter_mut().enumerate() {
                    if i != keep {
                        *sample = 0;
                    }
                }
            }
            DynamicImage::ImageRgb8(rgb)
        }
    }
}

impl ChannelDeriver for ImageChannelSplitter {
    fn derive(&self, channel: ChannelVariant, source: &[u8]) -> Result<Bytes, DerivationError> {
        let img = Self::decode(source)?;
        Self::encode(&img, channel, source.len())
    }

    /// Decodes the source once and encodes the three channels from it.
    fn derive_all(&self, source: &[u8]) -> Vec<(ChannelVariant, Result<Bytes, DerivationError>)> {
        match Self::decode(source) {
            Ok(img) => ChannelVariant::ALL
                .iter()
                .map(|&channel| (channel, Self::encode(&img, channel, source.len())))
                .collect(),
            Err(e) => ChannelVariant::ALL
                .iter()
                .map(|&channel| (channel, Err(e.clone())))
                .collect(),
        }
    }

    fn content_type(&self) -> &'static str {
        PNG_CONTENT_TYPE
    }

    fn name(&self) -> &'static str {
        "image"
    }
}
