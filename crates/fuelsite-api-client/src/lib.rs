//! HTTP client for the remote record store.
//!
//! The store is a plain REST API (`/<resource>`, `/<resource>/<id>`) holding
//! news items and price entries. This crate provides the low-level request
//! helpers and, in [`api`], the record operations used by the CLI.

pub mod api;

use anyhow::{Context, Result};
use fuelsite_core::RecordStoreConfig;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub use api::{ListParams, ListResponse, PageInfo, SortOrder};

/// Failures the caller may want to match on. Returned inside `anyhow::Error`;
/// use `downcast_ref::<ClientError>()`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// HTTP client for the record store.
#[derive(Clone, Debug)]
pub struct RecordClient {
    client: Client,
    base_url: String,
}

impl RecordClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RecordStoreConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.timeout)
    }

    /// Create client from environment: RECORDS_API_URL, RECORDS_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self> {
        let config = RecordStoreConfig::from_env()?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn non-success statuses into `ClientError`.
    async fn send(&self, request: RequestBuilder, path: &str) -> Result<reqwest::Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()).into());
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// GET request with query parameters. Returns the body and response headers.
    pub async fn get_with_headers<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(T, HeaderMap)> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = self.send(request, path).await?;
        let headers = response.headers().clone();
        Ok((Self::parse(response).await?, headers))
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.client.get(self.build_url(path)), path).await?;
        Self::parse(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request, path).await?;
        Self::parse(response).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self.send(request, path).await?;
        Self::parse(response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete_path(&self, path: &str) -> Result<()> {
        self.send(self.client.delete(self.build_url(path)), path)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RecordClient::new("http://localhost:4000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.build_url("/items"), "http://localhost:4000/items");
    }

    #[test]
    fn test_missing_fields_message() {
        let err = ClientError::MissingFields(vec!["title".to_string(), "content".to_string()]);
        assert_eq!(err.to_string(), "Missing required fields: title, content");
    }

    #[tokio::test]
    async fn test_status_error_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/items")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = RecordClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = client.get::<serde_json::Value>("/items").await.unwrap_err();

        match err.downcast_ref::<ClientError>() {
            Some(ClientError::Status { status, body }) => {
                assert_eq!(*status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
