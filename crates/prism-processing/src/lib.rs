//! Prism Processing Library
//!
//! Channel derivation strategies. A [`ChannelDeriver`] turns the bytes of one
//! source object into the payload for a single colour channel. The processor
//! only depends on the trait, so the pixel algorithm can be swapped or stubbed
//! without touching pipeline logic.

pub mod factory;
#[cfg(feature = "image")]
pub mod image;
pub mod raw;
pub mod traits;

pub use factory::create_deriver;
#[cfg(feature = "image")]
pub use self::image::ImageChannelSplitter;
pub use raw::RawPlaneSplitter;
pub use traits::ChannelDeriver;
