//! Error types module
//!
//! `PipelineError` is the single taxonomy surfaced by the submission pipeline and the
//! archive assembler. Adapter-level errors (store, transcoder, validator) are converted
//! into it at the service boundary, so handlers never look inside a third-party payload.

use serde::Serialize;
use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures such as bad input
    Debug,
    /// Degraded but handled
    Warn,
    /// Unexpected failures of a dependency
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Discriminant of `PipelineError`, serialized into error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Transcode,
    FolderInit,
    Upload,
    List,
    Link,
    Aborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transcode => "transcode",
            ErrorKind::FolderInit => "folder_init",
            ErrorKind::Upload => "upload",
            ErrorKind::List => "list",
            ErrorKind::Link => "link",
            ErrorKind::Aborted => "aborted",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Bad input; raised before any remote call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Folder initialization error: {message}")]
    FolderInit {
        message: String,
        payload: Option<Value>,
    },

    #[error("Upload error: {message}")]
    Upload {
        message: String,
        payload: Option<Value>,
    },

    #[error("List error: {message}")]
    List {
        message: String,
        payload: Option<Value>,
    },

    #[error("Link error: {message}")]
    Link {
        message: String,
        payload: Option<Value>,
    },

    /// Client went away or the request body could not be read to completion.
    #[error("Submission aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Transcode(_) => ErrorKind::Transcode,
            PipelineError::FolderInit { .. } => ErrorKind::FolderInit,
            PipelineError::Upload { .. } => ErrorKind::Upload,
            PipelineError::List { .. } => ErrorKind::List,
            PipelineError::Link { .. } => ErrorKind::Link,
            PipelineError::Aborted(_) => ErrorKind::Aborted,
        }
    }

    /// Underlying-service error payload, when the failing dependency returned one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            PipelineError::FolderInit { payload, .. }
            | PipelineError::Upload { payload, .. }
            | PipelineError::List { payload, .. }
            | PipelineError::Link { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Internal message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            PipelineError::Validation(message)
            | PipelineError::Transcode(message)
            | PipelineError::Aborted(message) => message,
            PipelineError::FolderInit { message, .. }
            | PipelineError::Upload { message, .. }
            | PipelineError::List { message, .. }
            | PipelineError::Link { message, .. } => message,
        }
    }

    /// A timeout of the external call belonging to `kind`.
    pub fn timeout(kind: ErrorKind, operation: &str, secs: u64) -> Self {
        let message = format!("{} timed out after {}s", operation, secs);
        match kind {
            ErrorKind::Validation => PipelineError::Validation(message),
            ErrorKind::Transcode => PipelineError::Transcode(message),
            ErrorKind::FolderInit => PipelineError::FolderInit {
                message,
                payload: None,
            },
            ErrorKind::Upload => PipelineError::Upload {
                message,
                payload: None,
            },
            ErrorKind::List => PipelineError::List {
                message,
                payload: None,
            },
            ErrorKind::Link => PipelineError::Link {
                message,
                payload: None,
            },
            ErrorKind::Aborted => PipelineError::Aborted(message),
        }
    }
}

/// Static metadata per kind: (error_code, recoverable, log_level).
fn static_metadata(kind: ErrorKind) -> (&'static str, bool, LogLevel) {
    match kind {
        ErrorKind::Validation => ("VALIDATION_ERROR", false, LogLevel::Debug),
        ErrorKind::Transcode => ("TRANSCODE_ERROR", false, LogLevel::Error),
        ErrorKind::FolderInit => ("FOLDER_INIT_ERROR", true, LogLevel::Error),
        ErrorKind::Upload => ("UPLOAD_ERROR", true, LogLevel::Error),
        ErrorKind::List => ("LIST_ERROR", true, LogLevel::Error),
        ErrorKind::Link => ("LINK_ERROR", true, LogLevel::Warn),
        ErrorKind::Aborted => ("ABORTED_ERROR", true, LogLevel::Warn),
    }
}

impl ErrorMetadata for PipelineError {
    /// Every failed terminal is reported as a generic server error.
    fn http_status_code(&self) -> u16 {
        500
    }

    fn error_code(&self) -> &'static str {
        static_metadata(self.kind()).0
    }

    fn is_recoverable(&self) -> bool {
        static_metadata(self.kind()).1
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::Validation(msg) => msg.clone(),
            PipelineError::Transcode(_) => "Failed to convert audio".to_string(),
            PipelineError::FolderInit { .. } => {
                "Failed to ensure archive folder exists".to_string()
            }
            PipelineError::Upload { .. } => "Failed to upload to remote storage".to_string(),
            PipelineError::List { .. } => "Failed to retrieve archive".to_string(),
            PipelineError::Link { .. } => "Failed to resolve playback link".to_string(),
            PipelineError::Aborted(_) => "Upload aborted".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self.kind()).2
    }
}
