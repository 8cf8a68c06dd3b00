use fuelsite_core::{DataUrl, EncodedImage, ImageKind, IngestConfig, OutputFormatPreference};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::error::IngestError;
use crate::image::{ImageCodec, ImageResize, NativeCodec};
use crate::search::{Candidate, CandidateSearch};

/// Lossy output formats of the raster path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl OutputFormat {
    /// WebP sources stay WebP; every other raster source is re-encoded as JPEG
    /// unless the deployment forces a format.
    pub fn select(source: ImageKind, preference: OutputFormatPreference) -> Self {
        match preference {
            OutputFormatPreference::Jpeg => OutputFormat::Jpeg,
            OutputFormatPreference::WebP => OutputFormat::WebP,
            OutputFormatPreference::Auto => match source {
                ImageKind::WebP => OutputFormat::WebP,
                _ => OutputFormat::Jpeg,
            },
        }
    }

    pub fn to_mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }
}

/// Limits applied by the raster path
#[derive(Debug, Clone, Copy)]
pub struct RasterSettings {
    pub budget_bytes: usize,
    pub hard_ceiling_bytes: usize,
    pub max_dimension: u32,
    pub preference: OutputFormatPreference,
}

impl From<&IngestConfig> for RasterSettings {
    fn from(config: &IngestConfig) -> Self {
        Self {
            budget_bytes: config.inline_budget_bytes,
            hard_ceiling_bytes: config.inline_hard_ceiling_bytes,
            max_dimension: config.max_output_dimension,
            preference: config.output_format,
        }
    }
}

/// Result of the candidate search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    /// False when no candidate met the budget and the smallest one was kept.
    pub within_budget: bool,
    pub attempts: usize,
}

impl CompressedImage {
    pub fn data_url_len(&self) -> usize {
        DataUrl::encoded_len(self.format.to_mime_type(), self.bytes.len())
    }

    pub fn to_data_url(&self) -> String {
        DataUrl::encode(self.format.to_mime_type(), &self.bytes)
    }
}

/// Replace (or add) the extension of a display name.
pub fn rewrite_extension(name: &str, extension: &str) -> String {
    let name = if name.trim().is_empty() { "image" } else { name };
    Path::new(name)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

/// Re-encodes raster images until they fit the inline budget
pub struct RasterCompressor<C: ImageCodec = NativeCodec> {
    codec: Arc<C>,
    settings: RasterSettings,
}

impl<C: ImageCodec> Clone for RasterCompressor<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            settings: self.settings,
        }
    }
}

impl<C: ImageCodec> RasterCompressor<C> {
    pub fn new(codec: Arc<C>, settings: RasterSettings) -> Self {
        Self { codec, settings }
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    fn fits(&self, format: OutputFormat, payload_len: usize) -> bool {
        payload_len <= self.settings.budget_bytes
            && DataUrl::encoded_len(format.to_mime_type(), payload_len)
                <= self.settings.hard_ceiling_bytes
    }

    /// Run the candidate search synchronously. CPU-bound; call from a
    /// blocking context.
    pub fn search(&self, bytes: &[u8], kind: ImageKind) -> Result<CompressedImage, IngestError> {
        let source = self
            .codec
            .decode(bytes, kind)
            .map_err(|e| IngestError::Compression(e.to_string()))?;

        let natural = self.codec.dimensions(&source);
        if natural.0 == 0 || natural.1 == 0 {
            return Err(IngestError::Compression(
                "Image has zero width or height".to_string(),
            ));
        }

        let fitted = ImageResize::fit_within(natural.0, natural.1, self.settings.max_dimension);
        let format = OutputFormat::select(kind, self.settings.preference);

        tracing::debug!(
            natural_width = natural.0,
            natural_height = natural.1,
            fitted_width = fitted.0,
            fitted_height = fitted.1,
            format = ?format,
            budget_bytes = self.settings.budget_bytes,
            "Starting compression search"
        );

        let mut smallest: Option<(Candidate, Vec<u8>)> = None;
        let mut attempts = 0;

        for candidate in CandidateSearch::new(natural, fitted) {
            attempts += 1;

            // Always render from the decoded source, never from a previous candidate
            let surface = self
                .codec
                .render(&source, candidate.width, candidate.height);
            let encoded = self
                .codec
                .encode(&surface, format, candidate.quality)
                .map_err(|e| IngestError::Compression(e.to_string()))?;

            tracing::debug!(
                width = candidate.width,
                height = candidate.height,
                quality = candidate.quality,
                size_bytes = encoded.len(),
                "Compression candidate encoded"
            );

            // The budget bounds the payload, the ceiling bounds the data URL
            if self.fits(format, encoded.len()) {
                return Ok(CompressedImage {
                    bytes: encoded,
                    format,
                    width: candidate.width,
                    height: candidate.height,
                    quality: candidate.quality,
                    within_budget: true,
                    attempts,
                });
            }

            let is_smaller = smallest
                .as_ref()
                .map_or(true, |(_, best)| encoded.len() < best.len());
            if is_smaller {
                smallest = Some((candidate, encoded));
            }
        }

        let (candidate, bytes) = smallest.ok_or_else(|| {
            IngestError::Compression("No compression candidates were produced".to_string())
        })?;

        tracing::warn!(
            width = candidate.width,
            height = candidate.height,
            quality = candidate.quality,
            size_bytes = bytes.len(),
            budget_bytes = self.settings.budget_bytes,
            "No candidate met the inline budget, keeping the smallest"
        );

        Ok(CompressedImage {
            bytes,
            format,
            width: candidate.width,
            height: candidate.height,
            quality: candidate.quality,
            within_budget: false,
            attempts,
        })
    }

    /// Compress a raster file into an inline `EncodedImage`.
    ///
    /// Decode and encode run on the blocking thread pool. Fails with
    /// `PayloadTooLarge` when even the best candidate's data URL exceeds the
    /// hard ceiling.
    pub async fn compress(
        &self,
        bytes: bytes::Bytes,
        kind: ImageKind,
        name: &str,
    ) -> Result<EncodedImage, IngestError> {
        let start = Instant::now();
        let compressor = self.clone();
        let compressed = tokio::task::spawn_blocking(move || compressor.search(&bytes, kind))
            .await
            .map_err(|e| IngestError::Compression(format!("Compression task failed: {}", e)))??;

        let data_url_len = compressed.data_url_len();
        if data_url_len > self.settings.hard_ceiling_bytes {
            return Err(IngestError::PayloadTooLarge {
                size: data_url_len,
                ceiling: self.settings.hard_ceiling_bytes,
            });
        }

        tracing::info!(
            width = compressed.width,
            height = compressed.height,
            quality = compressed.quality,
            format = compressed.format.to_mime_type(),
            size_bytes = compressed.bytes.len(),
            data_url_len,
            within_budget = compressed.within_budget,
            attempts = compressed.attempts,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Raster image compressed"
        );

        Ok(EncodedImage::new(
            compressed.to_data_url(),
            rewrite_extension(name, compressed.format.extension()),
        ))
    }
}
