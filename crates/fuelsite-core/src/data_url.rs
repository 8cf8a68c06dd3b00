//! `data:<mime>;base64,<payload>` encoding used for inline images.

use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Not a data URL")]
    MissingScheme,

    #[error("Data URL is not base64 encoded")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// A decoded inline data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Length of the data URL that `encode` would produce, without allocating it.
    pub fn encoded_len(mime: &str, payload_len: usize) -> usize {
        "data:".len() + mime.len() + ";base64,".len() + payload_len.div_ceil(3) * 4
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }

    pub fn parse(url: &str) -> Result<Self, DataUrlError> {
        let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingScheme)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUrlError::NotBase64)?;

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| DataUrlError::InvalidPayload(e.to_string()))?;

        Ok(DataUrl {
            mime: mime.to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_and_parse() {
        let url = DataUrl::encode("image/png", b"\x89PNG");
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, b"\x89PNG");
    }

    #[test]
    fn test_encoded_len_matches_encode() {
        for len in [0usize, 1, 2, 3, 4, 100, 1001] {
            let payload = vec![7u8; len];
            assert_eq!(
                DataUrl::encoded_len("image/webp", len),
                DataUrl::encode("image/webp", &payload).len()
            );
        }
    }

    #[test]
    fn test_parse_rejects_non_data_urls() {
        assert_eq!(
            DataUrl::parse("https://example.com/a.png"),
            Err(DataUrlError::MissingScheme)
        );
        assert_eq!(
            DataUrl::parse("data:image/svg+xml,<svg/>"),
            Err(DataUrlError::NotBase64)
        );
        assert!(matches!(
            DataUrl::parse("data:image/png;base64,***"),
            Err(DataUrlError::InvalidPayload(_))
        ));
    }
}
