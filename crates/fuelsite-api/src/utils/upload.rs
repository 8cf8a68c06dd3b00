//! Common utilities for the upload handler

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use fuelsite_core::AppError;

/// A file read from the `file` field of a multipart body.
#[derive(Debug)]
pub struct MultipartFile {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

fn multipart_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge("File too large".to_string());
    }
    AppError::InvalidInput(format!("{}: {}", context, err))
}

/// Extract file data, filename, and content type from multipart form.
/// Only one field named "file" is accepted; other fields are ignored.
pub async fn extract_multipart_file(mut multipart: Multipart) -> Result<MultipartFile, AppError> {
    let mut file: Option<MultipartFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if file.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data"))?;

        file = Some(MultipartFile {
            data: data.to_vec(),
            filename,
            content_type,
        });
    }

    file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        let limit = if max_size >= 1024 * 1024 {
            format!("{} MB", max_size / 1024 / 1024)
        } else {
            format!("{} KB", max_size / 1024)
        };
        return Err(AppError::PayloadTooLarge(format!(
            "File too large (max {})",
            limit
        )));
    }
    Ok(())
}

/// Only `image/*` uploads are stored. Parameters after `;` are ignored.
pub fn validate_image_content_type(content_type: &str) -> Result<(), AppError> {
    let normalized = content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase();

    if !normalized.starts_with("image/") || normalized.len() == "image/".len() {
        return Err(AppError::InvalidInput(
            "Only image files are allowed".to_string(),
        ));
    }
    Ok(())
}
