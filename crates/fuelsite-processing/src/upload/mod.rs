//! Upload orchestration
//!
//! - Remote upload client (remote)
//! - Ingestion pipeline tying validation, SVG and raster paths together (pipeline)
//! - Record avatar processing before save (record)

pub mod pipeline;
pub mod record;
pub mod remote;

pub use pipeline::IngestPipeline;
pub use record::process_record_avatar;
pub use remote::{HttpUploader, RemoteUploader};
