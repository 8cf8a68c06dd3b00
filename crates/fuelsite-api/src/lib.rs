//! Fuelsite API Library
//!
//! The upload endpoint used by the ingestion pipeline: accepts one image per
//! request, stores it on the local filesystem and serves it back under
//! `/uploads`.

mod handlers;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use handlers::upload::UploadResponse;
pub use state::AppState;
