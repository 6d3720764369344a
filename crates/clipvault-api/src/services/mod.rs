pub mod archive;
pub mod submission;

pub use archive::ArchiveService;
pub use submission::{SubmissionGuard, SubmissionService};
