use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use super::image::{EncodedImage, SourceFile};

/// Record identifier as issued by the remote store (string or numeric).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

/// File handle attached by the admin form before submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Bytes of the selected file. Never sent to the remote store.
    #[serde(skip)]
    pub source: Option<SourceFile>,
}

/// An avatar that still has to go through the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpload {
    #[serde(rename = "rawFile")]
    pub raw_file: RawFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PendingUpload {
    pub fn from_source(source: SourceFile) -> Self {
        let title = source.name.clone();
        Self {
            raw_file: RawFile {
                path: Some(title.clone()),
                source: Some(source),
            },
            src: None,
            title: Some(title),
        }
    }
}

/// Shapes the `avatar` field takes across the admin form and the stored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvatarField {
    Pending(PendingUpload),
    PendingList(Vec<PendingUpload>),
    Encoded(EncodedImage),
    Url(String),
    /// Any other shape, kept verbatim so one odd record cannot break a listing.
    Other(JsonValue),
}

impl AvatarField {
    /// The pending upload carried by this avatar, if any. For a list, the
    /// first entry is used.
    pub fn pending(&self) -> Option<&PendingUpload> {
        match self {
            AvatarField::Pending(p) => Some(p),
            AvatarField::PendingList(list) => list.first(),
            _ => None,
        }
    }
}

/// A news or price entry owned by the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarField>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Any other fields (price values, fuel type, ...) kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Displayable URL for an avatar value: a bare string is returned as-is,
/// an object yields its `src`.
pub fn resolve_image_url(avatar: Option<&AvatarField>) -> Option<&str> {
    match avatar? {
        AvatarField::Url(url) => Some(url.as_str()),
        AvatarField::Encoded(image) => Some(image.src.as_str()),
        AvatarField::Pending(pending) => pending.src.as_deref(),
        AvatarField::PendingList(_) | AvatarField::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_avatar_shapes_deserialize() {
        let record: ContentRecord = serde_json::from_value(json!({
            "id": "7",
            "title": "New station",
            "avatar": {"src": "data:image/jpeg;base64,AAAA", "title": "a.jpg"}
        }))
        .unwrap();
        assert!(matches!(record.avatar, Some(AvatarField::Encoded(_))));
        assert_eq!(record.id, Some(RecordId::Text("7".to_string())));

        let record: ContentRecord =
            serde_json::from_value(json!({"id": 3, "avatar": "/uploads/a.png"})).unwrap();
        assert!(matches!(record.avatar, Some(AvatarField::Url(_))));

        let record: ContentRecord = serde_json::from_value(json!({
            "avatar": {"rawFile": {"path": "pump.jpg"}, "src": "blob:http://localhost/1", "title": "pump.jpg"}
        }))
        .unwrap();
        let pending = record.avatar.as_ref().and_then(AvatarField::pending).unwrap();
        assert_eq!(pending.raw_file.path.as_deref(), Some("pump.jpg"));

        let record: ContentRecord =
            serde_json::from_value(json!({"avatar": [{"rawFile": {}}]})).unwrap();
        assert!(record.avatar.as_ref().and_then(AvatarField::pending).is_some());

        let record: ContentRecord = serde_json::from_value(json!({"avatar": null})).unwrap();
        assert!(record.avatar.is_none());
    }

    #[test]
    fn test_unrecognized_avatar_does_not_break_listing() {
        let input = json!([
            {"id": 1, "avatar": "/uploads/a.png"},
            {"id": 2, "avatar": {"title": "x.jpg"}},
            {"id": 3, "avatar": [{"src": "/uploads/b.png", "title": "b.png"}]},
            {"id": 4, "avatar": 42}
        ]);
        let records: Vec<ContentRecord> = serde_json::from_value(input.clone()).unwrap();

        assert_eq!(records.len(), 4);
        assert!(matches!(records[0].avatar, Some(AvatarField::Url(_))));
        for record in &records[1..] {
            assert!(matches!(record.avatar, Some(AvatarField::Other(_))));
            assert_eq!(resolve_image_url(record.avatar.as_ref()), None);
            assert!(record.avatar.as_ref().and_then(AvatarField::pending).is_none());
        }
        assert_eq!(serde_json::to_value(&records).unwrap(), input);
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let input = json!({
            "id": "1",
            "fuel": "diesel",
            "price": 1.79,
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let record: ContentRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(record.extra.get("fuel"), Some(&json!("diesel")));
        assert_eq!(serde_json::to_value(&record).unwrap(), input);
    }

    #[test]
    fn test_resolve_image_url() {
        assert_eq!(resolve_image_url(None), None);
        assert_eq!(
            resolve_image_url(Some(&AvatarField::Url("/a.png".into()))),
            Some("/a.png")
        );
        let encoded = AvatarField::Encoded(EncodedImage::new("https://x/a.png", "a.png"));
        assert_eq!(resolve_image_url(Some(&encoded)), Some("https://x/a.png"));
        let list = AvatarField::PendingList(vec![]);
        assert_eq!(resolve_image_url(Some(&list)), None);
    }

    #[test]
    fn test_raw_file_source_is_not_serialized() {
        let pending =
            PendingUpload::from_source(SourceFile::new(vec![1u8, 2, 3], "image/png", "a.png"));
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json, json!({"rawFile": {"path": "a.png"}, "title": "a.png"}));
    }
}
