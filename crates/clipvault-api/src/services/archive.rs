//! Archive assembler
//!
//! One listing, then link resolution fanned out with a bounded concurrency. An entry whose
//! link cannot be resolved is dropped from the result instead of failing the request.

use crate::state::AppState;
use clipvault_core::{display_name, ArchiveEntry, ErrorKind, PipelineError, RemoteEntry};
use futures::stream::{self, StreamExt};
use std::time::Duration;

pub struct ArchiveService<'a> {
    state: &'a AppState,
}

impl<'a> ArchiveService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Entries sorted ascending by ordinal; names without an ordinal sort first as 0.
    pub async fn list_archive(&self) -> Result<Vec<ArchiveEntry>, PipelineError> {
        let store_config = &self.state.config.store;
        let folder = store_config.archive_folder.as_str();
        let start = std::time::Instant::now();

        let listed = match tokio::time::timeout(
            Duration::from_secs(store_config.store_timeout_secs),
            self.state.store.list(folder),
        )
        .await
        {
            Ok(result) => result.map_err(|e| e.into_pipeline(ErrorKind::List))?,
            Err(_) => {
                return Err(PipelineError::timeout(
                    ErrorKind::List,
                    "list",
                    store_config.store_timeout_secs,
                ))
            }
        };
        let listed_count = listed.len();

        let resolved: Vec<Option<ArchiveEntry>> = stream::iter(listed)
            .map(|entry| self.resolve_entry(entry))
            .buffer_unordered(store_config.link_fanout_limit.max(1))
            .collect()
            .await;

        let mut entries: Vec<ArchiveEntry> = resolved.into_iter().flatten().collect();
        entries.sort_by(|a, b| {
            a.ordinal
                .cmp(&b.ordinal)
                .then_with(|| a.stored_name.cmp(&b.stored_name))
        });

        tracing::info!(
            folder = %folder,
            listed = listed_count,
            returned = entries.len(),
            dropped = listed_count - entries.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Archive assembled"
        );

        Ok(entries)
    }

    async fn resolve_entry(&self, entry: RemoteEntry) -> Option<ArchiveEntry> {
        let secs = self.state.config.store.link_timeout_secs;

        let link = match tokio::time::timeout(
            Duration::from_secs(secs),
            self.state.store.resolve_link(&entry.path),
        )
        .await
        {
            Ok(Ok(link)) if !link.is_empty() => link,
            Ok(Ok(_)) => {
                tracing::warn!(remote_path = %entry.path, "Dropping archive entry: empty link");
                return None;
            }
            Ok(Err(e)) => {
                let err = e.into_pipeline(ErrorKind::Link);
                tracing::warn!(
                    remote_path = %entry.path,
                    error = %err,
                    payload = ?err.payload(),
                    "Dropping archive entry: link resolution failed"
                );
                return None;
            }
            Err(_) => {
                let err = PipelineError::timeout(ErrorKind::Link, "resolve_link", secs);
                tracing::warn!(remote_path = %entry.path, error = %err, "Dropping archive entry");
                return None;
            }
        };

        let naming = &self.state.naming;
        Some(ArchiveEntry {
            ordinal: naming.ordinal(&entry.name).unwrap_or(0),
            display_name: display_name(
                &entry.name,
                self.state.config.naming.display_label.as_deref(),
            ),
            link,
            stored_name: entry.name,
        })
    }
}
