use fuelsite_core::{ImageKind, IngestConfig, SourceFile};

/// Reasons a submitted file is rejected before any processing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No file provided")]
    NoFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

/// Image file validator
///
/// Checks presence, byte length and declared media type. Never looks at the
/// file contents, so it is safe to run before any decode.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_file_size: usize,
    allowed_kinds: Vec<ImageKind>,
}

impl ImageValidator {
    pub fn new(max_file_size: usize, allowed_kinds: Vec<ImageKind>) -> Self {
        Self {
            max_file_size,
            allowed_kinds,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.max_file_size_bytes, config.allowed_kinds.clone())
    }

    /// Validate file size. A file of exactly `max_file_size` bytes is accepted.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate the declared content type against the allow-list.
    pub fn validate_content_type(&self, content_type: &str) -> Result<ImageKind, ValidationError> {
        match ImageKind::from_mime(content_type) {
            Some(kind) if self.allowed_kinds.contains(&kind) => Ok(kind),
            _ => Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self
                    .allowed_kinds
                    .iter()
                    .map(|k| k.mime().to_string())
                    .collect(),
            }),
        }
    }

    /// Run all checks and return the file's media kind.
    pub fn validate(&self, file: Option<&SourceFile>) -> Result<ImageKind, ValidationError> {
        let file = file.ok_or(ValidationError::NoFile)?;
        self.validate_file_size(file.len())?;
        self.validate_content_type(&file.content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> ImageValidator {
        ImageValidator::new(
            1024 * 1024, // 1MB
            vec![ImageKind::Jpeg, ImageKind::Png, ImageKind::Svg],
        )
    }

    fn file_of(size: usize, content_type: &str) -> SourceFile {
        SourceFile::new(vec![0u8; size], content_type, "upload.bin")
    }

    #[test]
    fn test_validate_file_size_boundary() {
        let validator = test_validator();
        assert!(validator.validate_file_size(1024 * 1024).is_ok());
        assert_eq!(
            validator.validate_file_size(1024 * 1024 + 1),
            Err(ValidationError::FileTooLarge {
                size: 1024 * 1024 + 1,
                max: 1024 * 1024
            })
        );
    }

    #[test]
    fn test_validate_missing_file() {
        let validator = test_validator();
        assert_eq!(validator.validate(None), Err(ValidationError::NoFile));
    }

    #[test]
    fn test_validate_content_type_case_insensitive() {
        let validator = test_validator();
        assert_eq!(
            validator.validate_content_type("Image/JPEG"),
            Ok(ImageKind::Jpeg)
        );
        assert_eq!(
            validator.validate_content_type("image/svg+xml;charset=utf-8"),
            Ok(ImageKind::Svg)
        );
    }

    #[test]
    fn test_validate_content_type_not_allowed() {
        let validator = test_validator();
        // Known kind, but not in this validator's allow-list
        assert!(matches!(
            validator.validate_content_type("image/gif"),
            Err(ValidationError::InvalidContentType { .. })
        ));
        assert!(matches!(
            validator.validate_content_type("application/pdf"),
            Err(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_validate_checks_size_before_type() {
        let validator = test_validator();
        let result = validator.validate(Some(&file_of(2 * 1024 * 1024, "text/html")));
        assert!(matches!(result, Err(ValidationError::FileTooLarge { .. })));
    }

    #[test]
    fn test_validate_ok_returns_kind() {
        let validator = test_validator();
        assert_eq!(
            validator.validate(Some(&file_of(10, "image/png"))),
            Ok(ImageKind::Png)
        );
    }
}
