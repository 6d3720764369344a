//! Buffering of the multipart `audio` field into a temporary artifact

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use clipvault_core::PipelineError;
use clipvault_processing::{TempArtifact, ValidationError};
use std::path::Path;
use tokio::io::AsyncWriteExt;

pub const AUDIO_FIELD: &str = "audio";

/// One received file, buffered to local disk and not yet validated.
#[derive(Debug)]
pub struct ReceivedUpload {
    pub artifact: TempArtifact,
    pub original_name: String,
    pub declared_mime: String,
    pub size: usize,
}

fn map_multipart_error(err: MultipartError) -> PipelineError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PipelineError::Validation(format!("Request body too large: {}", err.body_text()))
    } else {
        PipelineError::Aborted(format!("Failed to read upload: {}", err.body_text()))
    }
}

/// Keep a short alphanumeric extension so ffmpeg can use it as a hint.
fn temp_suffix(original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => ".upload".to_string(),
    }
}

async fn buffer_field(
    mut field: Field<'_>,
    upload_dir: &Path,
    max_size: usize,
) -> Result<ReceivedUpload, PipelineError> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let declared_mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let artifact = TempArtifact::create_in(upload_dir, &temp_suffix(&original_name), "upload")
        .await
        .map_err(|e| PipelineError::Aborted(format!("Failed to buffer upload: {}", e)))?;
    let mut writer = artifact
        .writer()
        .await
        .map_err(|e| PipelineError::Aborted(format!("Failed to buffer upload: {}", e)))?;

    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(map_multipart_error)? {
        size += chunk.len();
        if size > max_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: max_size,
            }
            .into());
        }
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| PipelineError::Aborted(format!("Failed to buffer upload: {}", e)))?;
    }
    writer
        .flush()
        .await
        .map_err(|e| PipelineError::Aborted(format!("Failed to buffer upload: {}", e)))?;

    tracing::debug!(
        original_name = %original_name,
        declared_mime = %declared_mime,
        size_bytes = size,
        "Upload buffered"
    );

    Ok(ReceivedUpload {
        artifact,
        original_name,
        declared_mime,
        size,
    })
}

/// Extract the single `audio` field. Other fields are ignored; a second `audio` field is
/// rejected.
pub async fn receive_audio(
    mut multipart: Multipart,
    upload_dir: &Path,
    max_size: usize,
) -> Result<ReceivedUpload, PipelineError> {
    let mut received: Option<ReceivedUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        if received.is_some() {
            return Err(PipelineError::Validation(format!(
                "Multiple '{}' fields are not allowed; send exactly one file",
                AUDIO_FIELD
            )));
        }
        received = Some(buffer_field(field, upload_dir, max_size).await?);
    }

    received.ok_or_else(|| ValidationError::MissingField(AUDIO_FIELD.to_string()).into())
}
