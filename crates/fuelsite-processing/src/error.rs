//! Ingestion error taxonomy.

use fuelsite_core::AppError;

use crate::validator::ValidationError;

/// Failures of the remote upload path. The pipeline absorbs these and falls
/// back to inline encoding.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload timed out")]
    Timeout,

    #[error("Upload request failed: {0}")]
    Network(String),

    #[error("Upload endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UploadError::Timeout
        } else if err.is_decode() {
            UploadError::InvalidResponse(err.to_string())
        } else {
            UploadError::Network(err.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Compression failed: {0}")]
    Compression(String),

    #[error("Encoded image is {size} bytes, above the hard ceiling of {ceiling} bytes")]
    PayloadTooLarge { size: usize, ceiling: usize },

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl IngestError {
    /// Message suitable for showing to the person who submitted the file.
    pub fn user_message(&self) -> String {
        match self {
            IngestError::Validation(ValidationError::NoFile) => "Please select an image".to_string(),
            IngestError::Validation(ValidationError::FileTooLarge { max, .. }) => format!(
                "File is too large (max {} MB), choose a smaller image",
                max / (1024 * 1024)
            ),
            IngestError::Validation(ValidationError::InvalidContentType { .. }) => {
                "Unsupported file type, use JPEG, PNG, GIF, WebP or SVG".to_string()
            }
            IngestError::Encoding(_) | IngestError::Compression(_) => {
                "Could not prepare image".to_string()
            }
            IngestError::PayloadTooLarge { .. } => {
                "Image is still too large after compression, choose a smaller image".to_string()
            }
            IngestError::Upload(_) => "Could not upload image".to_string(),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let message = err.user_message();
        match err {
            IngestError::Validation(ValidationError::FileTooLarge { .. })
            | IngestError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(message),
            IngestError::Validation(_) => AppError::InvalidInput(message),
            IngestError::Encoding(_) | IngestError::Compression(_) => {
                AppError::ImageProcessing(message)
            }
            IngestError::Upload(e) => AppError::Internal(e.to_string()),
        }
    }
}
