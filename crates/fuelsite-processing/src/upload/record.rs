use fuelsite_core::{AvatarField, ContentRecord};

use super::pipeline::IngestPipeline;
use crate::error::IngestError;
use crate::image::ImageCodec;

/// Run a record's pending avatar through the pipeline before it is sent to
/// the remote store.
///
/// Records whose avatar is already a URL or an encoded image, or that carry
/// no file bytes, are returned unchanged. A pipeline failure is returned so
/// the save can be aborted.
pub async fn process_record_avatar<C: ImageCodec>(
    pipeline: &IngestPipeline<C>,
    mut record: ContentRecord,
) -> Result<ContentRecord, IngestError> {
    let source = match record.avatar.as_ref().and_then(AvatarField::pending) {
        Some(pending) => pending.raw_file.source.clone(),
        None => return Ok(record),
    };

    let Some(source) = source else {
        tracing::debug!(
            record_id = ?record.id,
            "Pending avatar has no file contents, leaving record unchanged"
        );
        return Ok(record);
    };

    let encoded = pipeline.ingest(Some(source)).await?;
    tracing::debug!(
        record_id = ?record.id,
        inline = encoded.is_inline(),
        "Record avatar encoded"
    );
    record.avatar = Some(AvatarField::Encoded(encoded));

    Ok(record)
}
