use async_trait::async_trait;
use fuelsite_core::models::is_resource_uri;
use fuelsite_core::{EncodedImage, SourceFile};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::error::UploadError;

/// Offloads a validated file to an external store
#[async_trait]
pub trait RemoteUploader: Send + Sync {
    /// Upload the file and return a reference to the stored resource.
    async fn upload(&self, file: &SourceFile) -> Result<EncodedImage, UploadError>;
}

/// Body returned by the upload endpoint. The reference is read from `url`,
/// or from `src` for endpoints that answer with an image object.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    success: Option<bool>,
}

/// Multipart uploader for the HTTP upload endpoint
#[derive(Clone, Debug)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteUploader for HttpUploader {
    async fn upload(&self, file: &SourceFile) -> Result<EncodedImage, UploadError> {
        let start = Instant::now();

        let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| UploadError::Network(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await?;
        if body.success == Some(false) {
            return Err(UploadError::InvalidResponse(
                "Endpoint reported success=false".to_string(),
            ));
        }

        let url = body
            .url
            .or(body.src)
            .ok_or_else(|| UploadError::InvalidResponse("Response has no url".to_string()))?;
        if !is_resource_uri(&url) {
            return Err(UploadError::InvalidResponse(format!(
                "Expected an absolute or root-relative URL, got '{}'",
                url
            )));
        }

        tracing::info!(
            endpoint = %self.endpoint,
            url = %url,
            size_bytes = file.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image uploaded to remote endpoint"
        );

        Ok(EncodedImage::new(url, file.name.clone()))
    }
}
