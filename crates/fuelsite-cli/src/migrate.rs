//! Repair records whose avatar still points at a browser-local file.
//!
//! Older admin sessions saved avatars as `blob:` URLs or bare `rawFile`
//! handles. Those files only exist on the machine that uploaded them, so the
//! migration looks for a file of the same name under a search root, copies it
//! into the uploads directory and points the record at the copy.

use anyhow::{Context, Result};
use fuelsite_api_client::RecordClient;
use fuelsite_core::{AvatarField, ContentRecord, EncodedImage, RecordId};
use fuelsite_storage::keys::extension_of;
use fuelsite_storage::{record_image_key, Storage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{guess_content_type, truncate_string};

/// Directories never descended into while searching for files.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "target"];

/// Extension used when neither the found file nor the recorded name has one.
const FALLBACK_EXTENSION: &str = "png";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Records carrying a blob or rawFile reference.
    pub candidates: usize,
    pub migrated: usize,
    /// No file name could be derived from the avatar.
    pub unnamed: usize,
    /// No matching file under the search root.
    pub missing: usize,
    pub failed: usize,
}

fn last_segment(value: &str) -> Option<String> {
    value
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_blob_url(src: &str) -> bool {
    src.trim_start().to_ascii_lowercase().starts_with("blob:")
}

/// The file name to look for when a record's avatar refers to a local file,
/// or `None` when the avatar needs no migration.
///
/// Returns `Some(None)` for a local reference that carries no usable name.
pub fn local_file_reference(avatar: &AvatarField) -> Option<Option<String>> {
    match avatar {
        AvatarField::Pending(_) | AvatarField::PendingList(_) => {
            let pending = avatar.pending()?;
            let from_path = pending.raw_file.path.as_deref().and_then(last_segment);
            let from_src = pending
                .src
                .as_deref()
                .filter(|src| is_blob_url(src))
                .and_then(last_segment);
            Some(from_path.or(from_src))
        }
        AvatarField::Encoded(image) if is_blob_url(&image.src) => Some(last_segment(&image.src)),
        AvatarField::Url(url) if is_blob_url(url) => Some(last_segment(url)),
        _ => None,
    }
}

/// First file named `name` under `root`, skipping dependency and VCS directories.
pub fn find_file_by_name(root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !SKIPPED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
        })
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name().to_string_lossy() == name)
        .map(|entry| entry.into_path())
}

/// Storage key for the copied file: `item-<id><ext>`, keeping the found file's
/// extension, else the recorded name's, else `.png`.
fn target_key(id: &RecordId, found: &Path, recorded_name: &str) -> String {
    let found_name = found
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_with_ext = if !extension_of(&found_name).is_empty() {
        found_name
    } else if !extension_of(recorded_name).is_empty() {
        recorded_name.to_string()
    } else {
        format!("{}.{}", found_name, FALLBACK_EXTENSION)
    };

    record_image_key(&id.to_string(), &name_with_ext)
}

async fn migrate_one(
    client: &RecordClient,
    storage: &dyn Storage,
    resource: &str,
    id: &RecordId,
    found: &Path,
    recorded_name: &str,
) -> Result<String> {
    let bytes = tokio::fs::read(found)
        .await
        .with_context(|| format!("Failed to read {}", found.display()))?;

    let key = target_key(id, found, recorded_name);
    let url = storage
        .upload(&key, guess_content_type(found), bytes)
        .await
        .with_context(|| format!("Failed to store {}", key))?;

    let patch = ContentRecord {
        avatar: Some(AvatarField::Encoded(EncodedImage::new(
            url.clone(),
            recorded_name,
        ))),
        ..ContentRecord::default()
    };
    client.update(resource, id, patch).await?;

    Ok(url)
}

/// Migrate every record of `resource` whose avatar is a local file reference.
///
/// Per-record failures are logged and counted; only failing to list the
/// records aborts the run.
pub async fn migrate_record_images(
    client: &RecordClient,
    storage: &dyn Storage,
    resource: &str,
    search_root: &Path,
) -> Result<MigrationReport> {
    let records = client
        .get_all(resource)
        .await
        .with_context(|| format!("Failed to fetch {}", resource))?;

    let mut report = MigrationReport::default();

    for record in &records {
        let Some(reference) = record.avatar.as_ref().and_then(local_file_reference) else {
            continue;
        };
        report.candidates += 1;

        let Some(id) = record.id.as_ref() else {
            tracing::warn!("Record without id has a local avatar reference, skipping");
            report.failed += 1;
            continue;
        };
        let title = truncate_string(record.title.as_deref().unwrap_or(""), 40);

        let Some(name) = reference else {
            tracing::info!(id = %id, title = %title, "No file name to search for, skipping");
            report.unnamed += 1;
            continue;
        };

        let Some(found) = find_file_by_name(search_root, &name) else {
            tracing::info!(id = %id, file_name = %name, "File not found under search root, skipping");
            report.missing += 1;
            continue;
        };

        match migrate_one(client, storage, resource, id, &found, &name).await {
            Ok(url) => {
                tracing::info!(id = %id, title = %title, url = %url, "Record image migrated");
                report.migrated += 1;
            }
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Failed to migrate record image");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelsite_core::{PendingUpload, RawFile};
    use fuelsite_storage::LocalStorage;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_local_file_reference() {
        let blob = AvatarField::Encoded(EncodedImage::new(
            "blob:http://localhost:5173/5b1c-uuid",
            "pump.jpg",
        ));
        assert_eq!(local_file_reference(&blob), Some(Some("5b1c-uuid".to_string())));

        let raw = AvatarField::Pending(PendingUpload {
            raw_file: RawFile {
                path: Some("./photos/pump.jpg".to_string()),
                source: None,
            },
            src: Some("blob:http://localhost:5173/5b1c-uuid".to_string()),
            title: None,
        });
        assert_eq!(local_file_reference(&raw), Some(Some("pump.jpg".to_string())));

        let nameless = AvatarField::PendingList(vec![PendingUpload {
            raw_file: RawFile::default(),
            src: None,
            title: None,
        }]);
        assert_eq!(local_file_reference(&nameless), Some(None));

        let done = AvatarField::Encoded(EncodedImage::new("/uploads/item-1.jpg", "pump.jpg"));
        assert_eq!(local_file_reference(&done), None);
        assert_eq!(local_file_reference(&AvatarField::Url("https://x/a.png".into())), None);
        let odd = AvatarField::Other(serde_json::json!({"title": "blob:http://x/1"}));
        assert_eq!(local_file_reference(&odd), None);
    }

    #[test]
    fn test_find_file_skips_dependency_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::create_dir_all(root.join("assets/img")).unwrap();
        std::fs::write(root.join("node_modules/pkg/logo.png"), b"x").unwrap();
        std::fs::write(root.join("assets/img/pump.png"), b"x").unwrap();

        assert_eq!(
            find_file_by_name(root, "pump.png"),
            Some(root.join("assets/img/pump.png"))
        );
        assert_eq!(find_file_by_name(root, "logo.png"), None);
    }

    #[test]
    fn test_target_key_extension_fallbacks() {
        let id = RecordId::from("12");
        assert_eq!(target_key(&id, Path::new("/a/pump.JPG"), "pump.JPG"), "item-12.jpg");
        assert_eq!(target_key(&id, Path::new("/a/5b1c"), "5b1c"), "item-12.png");
    }

    #[tokio::test]
    async fn test_migrate_record_images() {
        let dir = tempfile::tempdir().unwrap();
        let search_root = dir.path().join("site");
        std::fs::create_dir_all(search_root.join("photos")).unwrap();
        std::fs::write(search_root.join("photos/pump.jpg"), [0xFFu8, 0xD8, 0xFF]).unwrap();

        let uploads = dir.path().join("uploads");
        let storage = LocalStorage::new(&uploads, "/uploads".to_string())
            .await
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/items")
            .with_status(200)
            .with_body(
                json!([
                    {"id": "1", "title": "Pump", "avatar": {"rawFile": {"path": "pump.jpg"}, "title": "pump.jpg"}},
                    {"id": "2", "title": "Gone", "avatar": {"src": "blob:http://localhost/abc", "title": "x.jpg"}},
                    {"id": "3", "title": "Done", "avatar": {"src": "/uploads/item-3.png", "title": "a.png"}},
                    {"id": "4", "title": "Plain"},
                    {"id": "5", "title": "Odd", "avatar": {"title": "pump.jpg"}}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/items/1")
            .match_body(Matcher::PartialJson(json!({
                "avatar": {"src": "/uploads/item-1.jpg", "title": "pump.jpg"}
            })))
            .with_status(200)
            .with_body(r#"{"id":"1"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = RecordClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let report = migrate_record_images(&client, &storage, "items", &search_root)
            .await
            .unwrap();

        assert_eq!(
            report,
            MigrationReport {
                candidates: 2,
                migrated: 1,
                unnamed: 0,
                missing: 1,
                failed: 0,
            }
        );
        assert_eq!(
            std::fs::read(uploads.join("item-1.jpg")).unwrap(),
            vec![0xFF, 0xD8, 0xFF]
        );
        update.assert_async().await;
    }
}
