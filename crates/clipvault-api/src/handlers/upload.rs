use crate::error::HttpAppError;
use crate::services::{SubmissionGuard, SubmissionService};
use crate::state::AppState;
use crate::utils::multipart::receive_audio;
use axum::{
    extract::{Multipart, State},
    Json,
};
use clipvault_core::CommitMetadata;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub stored_metadata: CommitMetadata,
}

#[tracing::instrument(
    skip(state, multipart),
    fields(submission_id = tracing::field::Empty, operation = "upload_audio")
)]
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut guard = SubmissionGuard::start();
    tracing::Span::current().record("submission_id", tracing::field::display(guard.id()));

    let received = match receive_audio(
        multipart,
        &state.config.processing.upload_dir,
        state.validator.max_file_size(),
    )
    .await
    {
        Ok(received) => received,
        Err(e) => {
            guard.fail(&e);
            return Err(e.into());
        }
    };

    let stored_metadata = SubmissionService::new(&state)
        .submit(&mut guard, received)
        .await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully!".to_string(),
        stored_metadata,
    }))
}
