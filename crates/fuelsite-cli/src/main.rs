//! fuelsite CLI: ingest site images and maintain records in the record store.
//!
//! Pipeline settings come from the environment (MAX_FILE_SIZE_MB, UPLOAD_ENDPOINT,
//! ...); record commands need RECORDS_API_URL.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fuelsite_api_client::RecordClient;
use fuelsite_cli::migrate::migrate_record_images;
use fuelsite_cli::{init_tracing, source_file_from_path};
use fuelsite_core::{AvatarField, ContentRecord, IngestConfig, PendingUpload};
use fuelsite_processing::{process_record_avatar, IngestPipeline};
use fuelsite_storage::LocalStorage;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fuelsite", about = "Fuel station site image tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one image through the ingestion pipeline and print the result
    Ingest {
        /// Path to the image
        path: PathBuf,
        /// Remote upload endpoint (overrides UPLOAD_ENDPOINT)
        #[arg(long)]
        upload_endpoint: Option<String>,
    },
    /// Create a record, ingesting its image first
    Publish {
        /// Record store resource
        #[arg(long, default_value = "items")]
        resource: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Image to attach as the record avatar
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Replace blob/rawFile avatars with files copied into the uploads dir
    MigrateImages {
        #[arg(long, default_value = "items")]
        resource: String,
        /// Directory searched recursively for the referenced files
        #[arg(long, default_value = ".")]
        search_root: PathBuf,
        /// Directory the files are copied into, served under /uploads
        #[arg(long, default_value = "public/uploads")]
        uploads_dir: PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn pipeline_from_env(upload_endpoint: Option<String>) -> anyhow::Result<IngestPipeline> {
    let mut config = IngestConfig::from_env().context("Invalid ingestion configuration")?;
    if upload_endpoint.is_some() {
        config.upload_endpoint = upload_endpoint;
    }
    Ok(IngestPipeline::from_config(&config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            path,
            upload_endpoint,
        } => {
            let pipeline = pipeline_from_env(upload_endpoint)?;
            let file = source_file_from_path(&path).await?;
            let image = pipeline
                .ingest(Some(file))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_json(&image)?;
        }
        Commands::Publish {
            resource,
            title,
            content,
            image,
        } => {
            let client = RecordClient::from_env()
                .context("Failed to create record client. Set RECORDS_API_URL")?;

            let avatar = match image {
                Some(path) => Some(AvatarField::Pending(PendingUpload::from_source(
                    source_file_from_path(&path).await?,
                ))),
                None => None,
            };
            let record = ContentRecord {
                title: Some(title),
                content: Some(content),
                avatar,
                ..ContentRecord::default()
            };

            let pipeline = pipeline_from_env(None)?;
            let record = process_record_avatar(&pipeline, record)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            let created = client.create(&resource, record).await?;
            print_json(&created)?;
        }
        Commands::MigrateImages {
            resource,
            search_root,
            uploads_dir,
        } => {
            let client = RecordClient::from_env()
                .context("Failed to create record client. Set RECORDS_API_URL")?;
            let storage = LocalStorage::new(&uploads_dir, "/uploads".to_string())
                .await
                .with_context(|| format!("Failed to open {}", uploads_dir.display()))?;

            let report = migrate_record_images(&client, &storage, &resource, &search_root).await?;
            tracing::info!(
                migrated = report.migrated,
                missing = report.missing,
                failed = report.failed,
                "Image migration finished"
            );
            print_json(&report)?;
        }
    }

    Ok(())
}
