//! Shared key generation for stored uploads.

use rand::Rng;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension of `filename` including the leading dot, lowercased, or an empty
/// string when there is none.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Key for a file received by the upload server: `file-<unix millis>-<9 random digits><ext>`.
pub fn generate_upload_key(original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("file-{}-{:09}{}", millis, suffix, extension_of(original_name))
}

/// Key for an image migrated onto a record: `item-<id><ext>`.
pub fn record_image_key(record_id: &str, original_name: &str) -> String {
    let id: String = record_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    format!("item-{}{}", id, extension_of(original_name))
}
