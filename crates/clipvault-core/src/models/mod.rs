//! Domain models shared across crates.

pub mod archive;
pub mod audio;
pub mod submission;

pub use archive::{ArchiveEntry, CommitMetadata, RemoteEntry};
pub use audio::AudioFormat;
pub use submission::SubmissionStage;
