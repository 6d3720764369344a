use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Remote store backends.
///
/// Defined in core because configuration selects it before any adapter is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Dropbox,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dropbox" => Ok(StorageBackend::Dropbox),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Dropbox => write!(f, "dropbox"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// How playback links are resolved for archive entries.
///
/// `Temporary` links expire after a few hours and are re-issued on every listing;
/// `Shared` links are permanent and may already exist for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    Temporary,
    Shared,
}

impl FromStr for LinkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temporary" | "temp" => Ok(LinkMode::Temporary),
            "shared" | "permanent" => Ok(LinkMode::Shared),
            _ => Err(anyhow::anyhow!("Invalid link mode: {}", s)),
        }
    }
}
