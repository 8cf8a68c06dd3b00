//! Record operations on top of [`RecordClient`].

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use fuelsite_core::{ContentRecord, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{ClientError, RecordClient};

/// Resource whose records must carry a title and content.
const NEWS_RESOURCE: &str = "items";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Pagination, sort and filter parameters for `get_list`.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<(String, SortOrder)>,
    /// Extra query filters; empty values are not sent.
    pub filter: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            sort: None,
            filter: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<ContentRecord>,
    pub total: usize,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Drop top-level fields that are null or empty strings.
pub fn strip_empty_fields(record: &ContentRecord) -> Result<Map<String, JsonValue>> {
    let value = serde_json::to_value(record).context("Failed to serialize record")?;
    let mut map = match value {
        JsonValue::Object(map) => map,
        _ => return Err(anyhow::anyhow!("Record did not serialize to a JSON object")),
    };
    map.retain(|_, v| !is_blank(v));
    Ok(map)
}

fn require_news_fields(record: &ContentRecord) -> Result<()> {
    let missing: Vec<String> = [("title", &record.title), ("content", &record.content)]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ClientError::MissingFields(missing).into());
    }
    Ok(())
}

impl RecordClient {
    /// `GET /<resource>?page=&limit=[&sortBy=&order=]`. The total comes from
    /// `X-Total-Count` when the store sends it, otherwise the page length.
    pub async fn get_list(&self, resource: &str, params: &ListParams) -> Result<ListResponse> {
        let mut query = vec![
            ("page", params.page.max(1).to_string()),
            ("limit", params.per_page.to_string()),
        ];
        if let Some((field, order)) = &params.sort {
            query.push(("sortBy", field.clone()));
            query.push(("order", order.as_str().to_string()));
        }
        for (key, value) in &params.filter {
            if !value.is_empty() {
                query.push((key.as_str(), value.clone()));
            }
        }

        let path = format!("/{}", resource);
        let (data, headers): (Vec<ContentRecord>, _) = self.get_with_headers(&path, &query).await?;

        let total = headers
            .get("x-total-count")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(data.len());

        tracing::debug!(resource, count = data.len(), total, "Fetched record list");

        Ok(ListResponse {
            page_info: PageInfo {
                has_next_page: data.len() == params.per_page as usize,
                has_previous_page: params.page > 1,
            },
            total,
            data,
        })
    }

    /// Fetch every record of a resource in one request.
    pub async fn get_all(&self, resource: &str) -> Result<Vec<ContentRecord>> {
        self.get(&format!("/{}", resource)).await
    }

    /// `GET /<resource>/<id>`.
    pub async fn get_one(&self, resource: &str, id: &RecordId) -> Result<ContentRecord> {
        self.get(&format!("/{}/{}", resource, id)).await
    }

    /// Fetch several records one after another. Records that cannot be
    /// fetched are skipped.
    pub async fn get_many(&self, resource: &str, ids: &[RecordId]) -> Result<Vec<ContentRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_one(resource, id).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(resource, id = %id, error = %e, "Skipping record that could not be fetched");
                }
            }
        }
        Ok(records)
    }

    /// `POST /<resource>` with `createdAt` (kept if already set) and `updatedAt`.
    pub async fn create(&self, resource: &str, mut record: ContentRecord) -> Result<ContentRecord> {
        if resource == NEWS_RESOURCE {
            require_news_fields(&record)?;
        }

        let now = now_rfc3339();
        if record.created_at.is_none() {
            record.created_at = Some(now.clone());
        }
        record.updated_at = Some(now);

        let created: ContentRecord = self.post_json(&format!("/{}", resource), &record).await?;
        tracing::info!(resource, id = ?created.id, "Record created");
        Ok(created)
    }

    /// `PUT /<resource>/<id>` with null and empty-string fields removed and
    /// `updatedAt` refreshed.
    pub async fn update(
        &self,
        resource: &str,
        id: &RecordId,
        mut record: ContentRecord,
    ) -> Result<ContentRecord> {
        record.updated_at = Some(now_rfc3339());
        let body = strip_empty_fields(&record)?;

        let updated: ContentRecord = self
            .put_json(&format!("/{}/{}", resource, id), &body)
            .await?;
        tracing::info!(resource, id = %id, "Record updated");
        Ok(updated)
    }

    /// `DELETE /<resource>/<id>` after checking that the record exists.
    pub async fn delete(&self, resource: &str, id: &RecordId) -> Result<RecordId> {
        let path = format!("/{}/{}", resource, id);

        self.get::<JsonValue>(&path).await.map_err(|e| {
            if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::NotFound(_))) {
                ClientError::NotFound(format!("{} {}", resource, id)).into()
            } else {
                e
            }
        })?;

        self.delete_path(&path).await?;
        tracing::info!(resource, id = %id, "Record deleted");
        Ok(id.clone())
    }
}
