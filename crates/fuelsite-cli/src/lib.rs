pub mod migrate;

use anyhow::Context;
use fuelsite_core::{ImageKind, SourceFile};
use std::path::Path;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Media type for a local file, guessed from its extension. Unknown
/// extensions map to `application/octet-stream`, which the validator rejects.
pub fn guess_content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageKind::from_extension)
        .map(|kind| kind.mime())
        .unwrap_or("application/octet-stream")
}

/// Read a local file into a `SourceFile`.
pub async fn source_file_from_path(path: &Path) -> anyhow::Result<SourceFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Ok(SourceFile::new(bytes, guess_content_type(path), name))
}

/// Initialize tracing for the CLI binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("Дизель ДТ-Евро", 9), "Дизель...");
    }

    #[test]
    fn guess_content_type_from_extension() {
        assert_eq!(guess_content_type(Path::new("a/pump.JPG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(
            guess_content_type(Path::new("menu.pdf")),
            "application/octet-stream"
        );
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn source_file_from_path_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sign.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let file = source_file_from_path(&path).await.unwrap();

        assert_eq!(file.name, "sign.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.len(), 3);
    }
}
