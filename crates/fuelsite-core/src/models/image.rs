use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media types accepted by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
    Svg,
}

impl ImageKind {
    pub const ALL: [ImageKind; 5] = [
        ImageKind::Jpeg,
        ImageKind::Png,
        ImageKind::Gif,
        ImageKind::WebP,
        ImageKind::Svg,
    ];

    /// Parse a declared content type. Parameters (`; charset=...`) are ignored
    /// and matching is case-insensitive. `image/jpg` is accepted as an alias.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            "image/webp" => Some(ImageKind::WebP),
            "image/svg+xml" => Some(ImageKind::Svg),
            _ => None,
        }
    }

    /// Guess the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::WebP),
            "svg" => Some(ImageKind::Svg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::WebP => "image/webp",
            ImageKind::Svg => "image/svg+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::WebP => "webp",
            ImageKind::Svg => "svg",
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, ImageKind::Svg)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A user-supplied file, consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub bytes: Bytes,
    pub content_type: String,
    pub name: String,
}

impl SourceFile {
    pub fn new(
        bytes: impl Into<Bytes>,
        content_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            name: name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The stored form of an image: either an inline data URL or a URI to an
/// uploaded resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub src: String,
    #[serde(default)]
    pub title: String,
}

impl EncodedImage {
    pub fn new(src: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            title: title.into(),
        }
    }

    pub fn is_inline(&self) -> bool {
        self.src.starts_with("data:")
    }
}

/// True for `http://`, `https://` and root-relative (`/path`) references.
pub fn is_resource_uri(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || (uri.starts_with('/') && !uri.starts_with("//"))
}
