//! Clipvault Core Library
//!
//! Configuration, the submission error taxonomy, domain models and the pure naming rules
//! shared by the storage, processing and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, ErrorMetadata, LogLevel, PipelineError};
pub use models::{ArchiveEntry, AudioFormat, CommitMetadata, RemoteEntry, SubmissionStage};
pub use naming::{display_name, NamingPolicy, NamingResolver};
pub use storage_types::{LinkMode, StorageBackend};
