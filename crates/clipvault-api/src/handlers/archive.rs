use crate::error::HttpAppError;
use crate::services::ArchiveService;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ArchiveEntryResponse {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub entries: Vec<ArchiveEntryResponse>,
}

#[tracing::instrument(skip(state), fields(operation = "list_archive"))]
pub async fn list_archive(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArchiveResponse>, HttpAppError> {
    let entries = ArchiveService::new(&state).list_archive().await?;

    Ok(Json(ArchiveResponse {
        entries: entries
            .into_iter()
            .map(|entry| ArchiveEntryResponse {
                name: entry.display_name,
                link: entry.link,
            })
            .collect(),
    }))
}
