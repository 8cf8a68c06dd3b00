//! Configuration module
//!
//! Environment-driven configuration for the ingestion pipeline, the upload
//! server and the record store client. Each struct is built once at startup
//! and passed explicitly to the component that needs it.

use std::env;
use std::time::Duration;

use crate::data_url::DataUrl;
use crate::models::ImageKind;

// Common constants
const MAX_FILE_SIZE_MB: usize = 5;
const INLINE_BUDGET_KB: usize = 200;
const INLINE_CEILING_RATIO: f64 = 1.37;
const MAX_OUTPUT_DIMENSION: u32 = 800;
const UPLOAD_TIMEOUT_SECS: u64 = 30;
const SERVER_PORT: u16 = 3001;
const RECORDS_TIMEOUT_SECS: u64 = 10;

/// Preferred output format for the raster path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormatPreference {
    /// WebP sources stay WebP, everything else becomes JPEG.
    #[default]
    Auto,
    Jpeg,
    WebP,
}

impl OutputFormatPreference {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Ingestion pipeline configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub max_file_size_bytes: usize,
    pub allowed_kinds: Vec<ImageKind>,
    /// Soft target for the encoded image bytes.
    pub inline_budget_bytes: usize,
    /// Absolute limit on the data URL length.
    pub inline_hard_ceiling_bytes: usize,
    pub max_output_dimension: u32,
    pub output_format: OutputFormatPreference,
    pub upload_endpoint: Option<String>,
    pub upload_timeout: Duration,
    pub svg_sanitize: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let inline_budget_bytes = INLINE_BUDGET_KB * 1024;
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_kinds: ImageKind::ALL.to_vec(),
            inline_budget_bytes,
            inline_hard_ceiling_bytes: ceiling_for(inline_budget_bytes, INLINE_CEILING_RATIO),
            max_output_dimension: MAX_OUTPUT_DIMENSION,
            output_format: OutputFormatPreference::Auto,
            upload_endpoint: None,
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            svg_sanitize: true,
        }
    }
}

fn ceiling_for(budget: usize, ratio: f64) -> usize {
    (budget as f64 * ratio).round() as usize
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_kinds = match env::var("ALLOWED_CONTENT_TYPES") {
            Ok(value) => value
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    ImageKind::from_mime(s).ok_or_else(|| {
                        anyhow::anyhow!("ALLOWED_CONTENT_TYPES contains unsupported type '{}'", s)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => ImageKind::ALL.to_vec(),
        };

        let inline_budget_kb = env::var("INLINE_BUDGET_KB")
            .unwrap_or_else(|_| INLINE_BUDGET_KB.to_string())
            .parse::<usize>()
            .unwrap_or(INLINE_BUDGET_KB);
        let ceiling_ratio = env::var("INLINE_CEILING_RATIO")
            .unwrap_or_else(|_| INLINE_CEILING_RATIO.to_string())
            .parse::<f64>()
            .unwrap_or(INLINE_CEILING_RATIO);
        let inline_budget_bytes = inline_budget_kb * 1024;

        let output_format = match env::var("OUTPUT_FORMAT") {
            Ok(value) => OutputFormatPreference::parse(&value).ok_or_else(|| {
                anyhow::anyhow!("OUTPUT_FORMAT must be one of: auto, jpeg, webp")
            })?,
            Err(_) => OutputFormatPreference::Auto,
        };

        let config = IngestConfig {
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_kinds,
            inline_budget_bytes,
            inline_hard_ceiling_bytes: ceiling_for(inline_budget_bytes, ceiling_ratio),
            max_output_dimension: env::var("MAX_OUTPUT_DIMENSION")
                .unwrap_or_else(|_| MAX_OUTPUT_DIMENSION.to_string())
                .parse()
                .unwrap_or(MAX_OUTPUT_DIMENSION),
            output_format,
            upload_endpoint: env::var("UPLOAD_ENDPOINT")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            upload_timeout: Duration::from_secs(
                env::var("UPLOAD_TIMEOUT_SECS")
                    .unwrap_or_else(|_| UPLOAD_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(UPLOAD_TIMEOUT_SECS),
            ),
            svg_sanitize: env::var("SVG_SANITIZE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_kinds.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one image type"
            ));
        }

        if self.inline_budget_bytes == 0 {
            return Err(anyhow::anyhow!("INLINE_BUDGET_KB must be greater than 0"));
        }

        // The ceiling applies to the data URL, so it must hold a full-budget payload
        let min_ceiling = DataUrl::encoded_len("image/jpeg", self.inline_budget_bytes);
        if self.inline_hard_ceiling_bytes < min_ceiling {
            return Err(anyhow::anyhow!(
                "Inline hard ceiling ({} bytes) cannot hold a data URL for the inline budget ({} bytes, needs {} bytes)",
                self.inline_hard_ceiling_bytes,
                self.inline_budget_bytes,
                min_ceiling
            ));
        }

        if self.max_output_dimension == 0 {
            return Err(anyhow::anyhow!("MAX_OUTPUT_DIMENSION must be greater than 0"));
        }

        if let Some(endpoint) = &self.upload_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "UPLOAD_ENDPOINT must be an http(s) URL, got '{}'",
                    endpoint
                ));
            }
        }

        Ok(())
    }

    pub fn is_allowed(&self, kind: ImageKind) -> bool {
        self.allowed_kinds.contains(&kind)
    }
}

/// Upload server configuration
#[derive(Clone, Debug)]
pub struct UploadServerConfig {
    pub server_port: u16,
    pub upload_dir: String,
    pub public_base_url: String,
    pub max_file_size_bytes: usize,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl UploadServerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let max_file_size_mb = env::var("UPLOAD_MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*")
            .collect();

        let config = UploadServerConfig {
            server_port,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            cors_origins,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upload_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_DIR must not be empty"));
        }

        if !self.public_base_url.starts_with("http://")
            && !self.public_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!("PUBLIC_BASE_URL must be an http(s) URL"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_MAX_FILE_SIZE_MB must be greater than 0"
            ));
        }

        Ok(())
    }

    /// URL prefix under which stored files are served.
    pub fn uploads_base_url(&self) -> String {
        format!("{}/uploads", self.public_base_url.trim_end_matches('/'))
    }
}

/// Remote record store configuration
#[derive(Clone, Debug)]
pub struct RecordStoreConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl RecordStoreConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_url = env::var("RECORDS_API_URL")
            .map_err(|_| anyhow::anyhow!("RECORDS_API_URL must be set"))?;

        let config = RecordStoreConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(
                env::var("RECORDS_TIMEOUT_SECS")
                    .unwrap_or_else(|_| RECORDS_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(RECORDS_TIMEOUT_SECS),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!("RECORDS_API_URL must be an http(s) URL"));
        }
        Ok(())
    }
}
