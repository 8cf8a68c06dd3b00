//! Fuelsite Processing Library
//!
//! Turns a file selected in the admin form into the value stored in a
//! record's image field. Every file is validated first; SVG markup is
//! sanitized and inlined, raster images are uploaded when an endpoint is
//! configured and otherwise compressed into an inline data URL that fits the
//! storage budget.

pub mod compression;
pub mod error;
pub mod image;
pub mod search;
pub mod svg;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use compression::{rewrite_extension, CompressedImage, OutputFormat, RasterCompressor, RasterSettings};
pub use error::{IngestError, UploadError};
pub use crate::image::{CodecError, ImageCodec, ImageResize, NativeCodec};
pub use search::{Candidate, CandidateSearch};
pub use svg::{encode_svg, QuickXmlSanitizer, SanitizeError, SvgSanitizer};
pub use upload::{process_record_avatar, HttpUploader, IngestPipeline, RemoteUploader};
pub use validator::{ImageValidator, ValidationError};
