use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stages of the submission pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Transcoding,
    FolderEnsuring,
    Naming,
    Committing,
    CleaningUp,
    Done,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Received => "received",
            SubmissionStage::Transcoding => "transcoding",
            SubmissionStage::FolderEnsuring => "folder_ensuring",
            SubmissionStage::Naming => "naming",
            SubmissionStage::Committing => "committing",
            SubmissionStage::CleaningUp => "cleaning_up",
            SubmissionStage::Done => "done",
        }
    }
}

impl Display for SubmissionStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
