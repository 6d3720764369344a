//! Clipvault Processing Library
//!
//! Validation of incoming audio, format detection, scoped temporary files and the
//! transcoding adapter.

pub mod artifact;
pub mod detect;
pub mod transcode;
pub mod validator;

pub use artifact::TempArtifact;
pub use detect::detect_format;
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder};
pub use validator::{MediaValidator, ValidationError};
