//! Fuelsite Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by the ingestion pipeline, the upload server, the record client and the CLI.

pub mod config;
pub mod data_url;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{IngestConfig, OutputFormatPreference, RecordStoreConfig, UploadServerConfig};
pub use data_url::{DataUrl, DataUrlError};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    resolve_image_url, AvatarField, ContentRecord, EncodedImage, ImageKind, PendingUpload,
    RawFile, RecordId, SourceFile,
};
