//! Ingestion pipeline: validate → (svg | upload → raster).
//!
//! One `ingest` call turns one submitted file into exactly one
//! `EncodedImage`. The pipeline holds no per-call state, so a single instance
//! can be shared across concurrent submissions.

use fuelsite_core::{EncodedImage, ImageKind, IngestConfig, SourceFile};
use std::sync::Arc;

use super::remote::{HttpUploader, RemoteUploader};
use crate::compression::{RasterCompressor, RasterSettings};
use crate::error::IngestError;
use crate::image::{ImageCodec, NativeCodec};
use crate::svg::{encode_svg, QuickXmlSanitizer, SvgSanitizer};
use crate::validator::{ImageValidator, ValidationError};

pub struct IngestPipeline<C: ImageCodec = NativeCodec> {
    validator: ImageValidator,
    compressor: RasterCompressor<C>,
    uploader: Option<Arc<dyn RemoteUploader>>,
    sanitizer: Option<Arc<dyn SvgSanitizer>>,
}

impl IngestPipeline<NativeCodec> {
    /// Build the production pipeline: native codec, quick-xml sanitizer unless
    /// disabled, and an HTTP uploader when an endpoint is configured.
    pub fn from_config(config: &IngestConfig) -> Self {
        let pipeline = Self::with_codec(config, Arc::new(NativeCodec));

        match &config.upload_endpoint {
            Some(endpoint) => match HttpUploader::new(endpoint.clone(), config.upload_timeout) {
                Ok(uploader) => pipeline.with_uploader(Arc::new(uploader)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        endpoint = %endpoint,
                        "Upload endpoint configured but client could not be created, inlining only"
                    );
                    pipeline
                }
            },
            None => pipeline,
        }
    }
}

impl<C: ImageCodec> IngestPipeline<C> {
    /// Pipeline with a custom codec and no uploader.
    pub fn with_codec(config: &IngestConfig, codec: Arc<C>) -> Self {
        let sanitizer: Option<Arc<dyn SvgSanitizer>> = if config.svg_sanitize {
            Some(Arc::new(QuickXmlSanitizer))
        } else {
            None
        };

        Self {
            validator: ImageValidator::from_config(config),
            compressor: RasterCompressor::new(codec, RasterSettings::from(config)),
            uploader: None,
            sanitizer,
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn RemoteUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Option<Arc<dyn SvgSanitizer>>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn has_uploader(&self) -> bool {
        self.uploader.is_some()
    }

    /// Produce the stored representation of one submitted file.
    ///
    /// Validation failures are returned before any decode. Upload failures
    /// are logged and fall through to inline compression; all other failures
    /// are returned to the caller.
    #[tracing::instrument(
        skip(self, file),
        fields(
            file_name = tracing::field::Empty,
            content_type = tracing::field::Empty,
            size_bytes = tracing::field::Empty,
        )
    )]
    pub async fn ingest(&self, file: Option<SourceFile>) -> Result<EncodedImage, IngestError> {
        let file = match file {
            Some(file) => file,
            None => {
                tracing::debug!("Rejected submission without a file");
                return Err(ValidationError::NoFile.into());
            }
        };

        let span = tracing::Span::current();
        span.record("file_name", file.name.as_str());
        span.record("content_type", file.content_type.as_str());
        span.record("size_bytes", file.len());

        let kind = self.validator.validate(Some(&file)).map_err(|e| {
            tracing::debug!(error = %e, "File rejected by validator");
            IngestError::from(e)
        })?;

        if kind.is_vector() {
            return encode_svg(&file.bytes, &file.name, self.sanitizer.as_deref());
        }

        if let Some(uploader) = &self.uploader {
            match uploader.upload(&file).await {
                Ok(image) => return Ok(image),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Remote upload failed, falling back to inline encoding"
                    );
                }
            }
        }

        self.compress_inline(file, kind).await
    }

    async fn compress_inline(
        &self,
        file: SourceFile,
        kind: ImageKind,
    ) -> Result<EncodedImage, IngestError> {
        let SourceFile { bytes, name, .. } = file;
        self.compressor.compress(bytes, kind, &name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use async_trait::async_trait;
    use fuelsite_core::DataUrl;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingUploader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteUploader for FailingUploader {
        async fn upload(&self, _file: &SourceFile) -> Result<EncodedImage, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(UploadError::Timeout)
        }
    }

    struct FixedUploader;

    #[async_trait]
    impl RemoteUploader for FixedUploader {
        async fn upload(&self, file: &SourceFile) -> Result<EncodedImage, UploadError> {
            Ok(EncodedImage::new("/uploads/file-1-000000001.png", file.name.clone()))
        }
    }

    fn tiny_png() -> SourceFile {
        let img = image::DynamicImage::new_rgb8(4, 4);
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        SourceFile::new(buf, "image/png", "dot.png")
    }

    #[tokio::test]
    async fn test_missing_file_is_validation_error() {
        let pipeline = IngestPipeline::from_config(&IngestConfig::default());
        let result = pipeline.ingest(None).await;
        assert!(matches!(
            result,
            Err(IngestError::Validation(ValidationError::NoFile))
        ));
    }

    #[tokio::test]
    async fn test_upload_success_skips_compression() {
        let pipeline = IngestPipeline::from_config(&IngestConfig::default())
            .with_uploader(Arc::new(FixedUploader));
        let image = pipeline.ingest(Some(tiny_png())).await.unwrap();
        assert_eq!(image.src, "/uploads/file-1-000000001.png");
        assert_eq!(image.title, "dot.png");
    }

    #[tokio::test]
    async fn test_upload_failure_falls_back_once() {
        let uploader = Arc::new(FailingUploader {
            calls: AtomicUsize::new(0),
        });
        let pipeline = IngestPipeline::from_config(&IngestConfig::default())
            .with_uploader(uploader.clone());

        let image = pipeline.ingest(Some(tiny_png())).await.unwrap();

        assert!(image.src.starts_with("data:image/jpeg;base64,"));
        assert_eq!(image.title, "dot.jpg");
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_svg_never_uploaded() {
        let uploader = Arc::new(FailingUploader {
            calls: AtomicUsize::new(0),
        });
        let pipeline = IngestPipeline::from_config(&IngestConfig::default())
            .with_uploader(uploader.clone());

        let svg = SourceFile::new(&b"<svg><circle r=\"1\"/></svg>"[..], "image/svg+xml", "dot.svg");
        let image = pipeline.ingest(Some(svg)).await.unwrap();

        assert_eq!(DataUrl::parse(&image.src).unwrap().mime, "image/svg+xml");
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_sanitizer_inlines_markup_unchanged() {
        let config = IngestConfig {
            svg_sanitize: false,
            ..IngestConfig::default()
        };
        let pipeline = IngestPipeline::from_config(&config);
        let markup = b"<svg><script>alert(1)</script></svg>";
        let image = pipeline
            .ingest(Some(SourceFile::new(&markup[..], "image/svg+xml", "x.svg")))
            .await
            .unwrap();
        assert_eq!(DataUrl::parse(&image.src).unwrap().bytes, markup.to_vec());
    }

    #[tokio::test]
    async fn test_from_config_builds_uploader_for_endpoint() {
        let config = IngestConfig {
            upload_endpoint: Some("http://localhost:3001/upload".to_string()),
            ..IngestConfig::default()
        };
        assert!(IngestPipeline::from_config(&config).has_uploader());
        assert!(!IngestPipeline::from_config(&IngestConfig::default()).has_uploader());
    }
}
