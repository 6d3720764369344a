use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object as reported by a remote folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Name within the folder, as stored.
    pub name: String,
    /// Full remote path, suitable for link resolution.
    pub path: String,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Canonical metadata returned by the remote store after a committed upload.
///
/// `name` and `path` reflect any rename the store applied to avoid a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitMetadata {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_modified: Option<DateTime<Utc>>,
}

/// A stored clip as surfaced to an archive listing.
///
/// Built per request and never persisted; `link` is resolved fresh each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub stored_name: String,
    pub ordinal: u64,
    pub link: String,
    pub display_name: String,
}
