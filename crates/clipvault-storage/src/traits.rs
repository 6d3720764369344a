//! Remote store abstraction
//!
//! This module defines the RemoteStore trait that all storage backends must implement, and the
//! typed error every backend normalizes its service-specific failures into.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use clipvault_core::{CommitMetadata, ErrorKind, PipelineError, RemoteEntry};
use serde_json::Value;
use thiserror::Error;

/// Remote store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service answered with an error status. `payload` holds its error body when it was
    /// valid JSON.
    #[error("Remote store returned {status}: {summary}")]
    Api {
        status: u16,
        summary: String,
        payload: Option<Value>,
    },

    #[error("Remote store request failed: {0}")]
    Transport(String),

    #[error("Unexpected remote store response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid remote path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl StoreError {
    /// Underlying-service payload, if the service returned one.
    pub fn payload(&self) -> Option<Value> {
        match self {
            StoreError::Api {
                payload: Some(payload),
                ..
            } => Some(payload.clone()),
            StoreError::Api {
                status, summary, ..
            } => Some(serde_json::json!({ "status": status, "error_summary": summary })),
            _ => None,
        }
    }

    /// Lift into the pipeline taxonomy under the stage that made the call.
    pub fn into_pipeline(self, kind: ErrorKind) -> PipelineError {
        let payload = self.payload();
        let message = self.to_string();
        match kind {
            ErrorKind::FolderInit => PipelineError::FolderInit { message, payload },
            ErrorKind::Upload => PipelineError::Upload { message, payload },
            ErrorKind::List => PipelineError::List { message, payload },
            ErrorKind::Link => PipelineError::Link { message, payload },
            ErrorKind::Transcode => PipelineError::Transcode(message),
            ErrorKind::Validation => PipelineError::Validation(message),
            ErrorKind::Aborted => PipelineError::Aborted(message),
        }
    }
}

/// Result type for remote store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an idempotent folder initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Created,
    AlreadyExists,
}

/// Remote store abstraction
///
/// All backends (Dropbox, local filesystem) implement this trait so the submission pipeline and
/// the archive assembler never see a service-specific error shape.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create the folder if it does not exist yet.
    ///
    /// An existing folder is reported as `AlreadyExists`, never as an error.
    async fn ensure_folder(&self, path: &str) -> StoreResult<FolderStatus>;

    /// Store `data` at `path` using add + autorename.
    ///
    /// The returned metadata carries the canonical name and path, which differ from the request
    /// when the store renamed the object to avoid a conflict.
    async fn commit(&self, path: &str, data: Bytes) -> StoreResult<CommitMetadata>;

    /// List the files directly inside `folder`. A missing folder lists as empty.
    async fn list(&self, folder: &str) -> StoreResult<Vec<RemoteEntry>>;

    /// Resolve a playback URL for a stored object.
    ///
    /// Links may rotate, so callers must not cache the result.
    async fn resolve_link(&self, path: &str) -> StoreResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
