//! Image channel derivation
//!
//! Decodes the source with the `image` crate and re-encodes a single channel
//! as PNG.

pub mod splitter;

pub use splitter::ImageChannelSplitter;
