use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use fuelsite_storage::generate_upload_key;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{
    extract_multipart_file, validate_file_size, validate_image_content_type,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: usize,
}

/// `POST /upload`: store one image from the multipart field `file`.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let start = Instant::now();
    let file = extract_multipart_file(multipart).await?;

    validate_image_content_type(&file.content_type)?;
    validate_file_size(file.data.len(), state.max_file_size_bytes)?;

    let key = generate_upload_key(&file.filename);
    let size = file.data.len();
    let url = state
        .storage
        .upload(&key, &file.content_type, file.data)
        .await?;

    tracing::info!(
        filename = %key,
        original_name = %file.filename,
        content_type = %file.content_type,
        size_bytes = size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "File uploaded"
    );

    Ok(Json(UploadResponse {
        success: true,
        url,
        filename: key,
        original_name: file.filename,
        size,
    }))
}
