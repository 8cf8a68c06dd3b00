//! Raster image backend
//!
//! - Codec abstraction and its native implementation (codec)
//! - Aspect-preserving resize helpers (resize)

pub mod codec;
pub mod resize;

pub use codec::{CodecError, ImageCodec, NativeCodec};
pub use resize::ImageResize;
