//! Submission pipeline
//!
//! Received -> (Transcoding) -> FolderEnsuring -> Naming -> Committing -> CleaningUp -> Done.
//! Any stage may fail; CleaningUp runs on every path that returns, and `Drop` of the
//! artifacts covers the paths that do not (cancellation, panic).

use crate::state::AppState;
use crate::utils::multipart::ReceivedUpload;
use clipvault_core::{
    CommitMetadata, ErrorKind, ErrorMetadata, LogLevel, PipelineError, SubmissionStage,
};
use clipvault_processing::{detect_format, TempArtifact};
use std::future::Future;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tracks the stage of one submission and reports it if the submission never finishes.
///
/// Axum drops the handler future when the client disconnects; the guard's `Drop` is what
/// records that case.
#[derive(Debug)]
pub struct SubmissionGuard {
    id: Uuid,
    stage: SubmissionStage,
    started: Instant,
    settled: bool,
}

impl SubmissionGuard {
    pub fn start() -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(submission_id = %id, stage = %SubmissionStage::Received, "Submission started");
        Self {
            id,
            stage: SubmissionStage::Received,
            started: Instant::now(),
            settled: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn enter(&mut self, stage: SubmissionStage) {
        tracing::debug!(
            submission_id = %self.id,
            from = %self.stage,
            to = %stage,
            "Submission stage"
        );
        self.stage = stage;
    }

    pub fn fail(&mut self, error: &PipelineError) {
        self.settled = true;
        let duration_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        match error.log_level() {
            LogLevel::Error => tracing::error!(
                submission_id = %self.id,
                stage = %self.stage,
                code = error.error_code(),
                error = %error,
                duration_ms = duration_ms,
                "Submission failed"
            ),
            LogLevel::Warn | LogLevel::Debug => tracing::warn!(
                submission_id = %self.id,
                stage = %self.stage,
                code = error.error_code(),
                error = %error,
                duration_ms = duration_ms,
                "Submission rejected"
            ),
        }
    }

    pub fn finish(&mut self, metadata: &CommitMetadata) {
        self.settled = true;
        self.stage = SubmissionStage::Done;
        tracing::info!(
            submission_id = %self.id,
            remote_path = %metadata.path,
            size_bytes = metadata.size,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Submission committed"
        );
    }
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                submission_id = %self.id,
                stage = %self.stage,
                code = "ABORTED_ERROR",
                duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
                "Submission aborted before completion"
            );
        }
    }
}

/// Temporary files owned by one submission.
struct Artifacts {
    upload: TempArtifact,
    transcoded: Option<TempArtifact>,
}

impl Artifacts {
    /// The file the next stage should read.
    fn current(&self) -> &TempArtifact {
        self.transcoded.as_ref().unwrap_or(&self.upload)
    }

    /// Failures are logged and never replace the pipeline result.
    async fn release_all(self, submission_id: Uuid) {
        let all = std::iter::once(self.upload).chain(self.transcoded);
        for artifact in all {
            let path = artifact.path().to_path_buf();
            let label = artifact.label();
            if let Err(e) = artifact.release().await {
                tracing::warn!(
                    submission_id = %submission_id,
                    path = %path.display(),
                    label = label,
                    error = %e,
                    "Failed to release temporary artifact"
                );
            }
        }
    }
}

/// Bound an external call; elapsed time maps to the stage's error kind.
async fn bounded<T, E, F>(
    secs: u64,
    kind: ErrorKind,
    operation: &str,
    call: F,
    lift: impl FnOnce(E) -> PipelineError,
) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), call).await {
        Ok(result) => result.map_err(lift),
        Err(_) => Err(PipelineError::timeout(kind, operation, secs)),
    }
}

pub struct SubmissionService<'a> {
    state: &'a AppState,
}

impl<'a> SubmissionService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Run one received upload through the pipeline. Temporary files are released before
    /// this returns, whatever the outcome.
    pub async fn submit(
        &self,
        guard: &mut SubmissionGuard,
        upload: ReceivedUpload,
    ) -> Result<CommitMetadata, PipelineError> {
        let ReceivedUpload {
            artifact,
            original_name,
            declared_mime,
            size,
        } = upload;

        let mut artifacts = Artifacts {
            upload: artifact,
            transcoded: None,
        };

        let result = self
            .run(guard, &mut artifacts, &original_name, &declared_mime, size)
            .await;

        guard.enter(SubmissionStage::CleaningUp);
        artifacts.release_all(guard.id()).await;

        match &result {
            Ok(metadata) => guard.finish(metadata),
            Err(e) => guard.fail(e),
        }

        result
    }

    async fn run(
        &self,
        guard: &mut SubmissionGuard,
        artifacts: &mut Artifacts,
        original_name: &str,
        declared_mime: &str,
        size: usize,
    ) -> Result<CommitMetadata, PipelineError> {
        let config = &self.state.config;
        let store = &self.state.store;

        // Received: nothing remote happens before this passes.
        self.state.validator.validate_all(declared_mime, size)?;

        let source = detect_format(artifacts.current(), declared_mime, original_name)
            .await
            .map_err(|e| PipelineError::Aborted(format!("Failed to read buffered upload: {}", e)))?;
        let target = config.processing.target_format;

        if source != target {
            guard.enter(SubmissionStage::Transcoding);
            let output = bounded(
                config.processing.transcode_timeout_secs,
                ErrorKind::Transcode,
                "transcode",
                self.state.transcoder.transcode(artifacts.current(), source, target),
                PipelineError::from,
            )
            .await?;
            artifacts.transcoded = Some(output);
        }

        let folder = config.store.archive_folder.as_str();
        let store_secs = config.store.store_timeout_secs;

        guard.enter(SubmissionStage::FolderEnsuring);
        let status = bounded(
            store_secs,
            ErrorKind::FolderInit,
            "ensure_folder",
            store.ensure_folder(folder),
            |e| e.into_pipeline(ErrorKind::FolderInit),
        )
        .await?;
        tracing::debug!(submission_id = %guard.id(), folder = %folder, status = ?status, "Archive folder ready");

        guard.enter(SubmissionStage::Naming);
        let name = if self.state.naming.needs_listing() {
            let existing = bounded(
                store_secs,
                ErrorKind::List,
                "list",
                store.list(folder),
                |e| e.into_pipeline(ErrorKind::List),
            )
            .await?;
            self.state
                .naming
                .next_name(existing.iter().map(|entry| entry.name.as_str()), target)
        } else {
            self.state.naming.next_name(std::iter::empty(), target)
        };
        let remote_path = format!("{}/{}", folder, name);

        guard.enter(SubmissionStage::Committing);
        let data = artifacts.current().read_all().await.map_err(|e| PipelineError::Upload {
            message: format!("Failed to read local file before commit: {}", e),
            payload: None,
        })?;
        let metadata = bounded(
            store_secs,
            ErrorKind::Upload,
            "commit",
            store.commit(&remote_path, data),
            |e| e.into_pipeline(ErrorKind::Upload),
        )
        .await?;

        if metadata.path != remote_path {
            tracing::info!(
                submission_id = %guard.id(),
                requested = %remote_path,
                stored = %metadata.path,
                "Remote store renamed the clip to avoid a conflict"
            );
        }

        Ok(metadata)
    }
}
