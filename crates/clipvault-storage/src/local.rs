use crate::traits::{FolderStatus, RemoteStore, StoreError, StoreResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use clipvault_core::{CommitMetadata, RemoteEntry};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const MAX_AUTORENAME_ATTEMPTS: u32 = 10_000;
/// In-flight commits; never listed.
const STAGING_PREFIX: &str = ".clipvault-commit-";

/// Local filesystem store with the same folder, conflict and listing semantics as the
/// Dropbox backend.
#[derive(Clone, Debug)]
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory that remote paths are resolved against (e.g., "/var/lib/clipvault")
    /// * `base_url` - Base URL the root is served from (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map an absolute remote path onto the storage root.
    ///
    /// Rejects empty, relative and `..` segments so nothing resolves outside `base_path`.
    fn remote_to_fs(&self, remote_path: &str) -> StoreResult<PathBuf> {
        let relative = remote_path.strip_prefix('/').ok_or_else(|| {
            StoreError::InvalidPath(format!("{} is not an absolute path", remote_path))
        })?;

        let mut path = self.base_path.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StoreError::InvalidPath(format!(
                    "{} contains an invalid segment",
                    remote_path
                )));
            }
            path.push(segment);
        }

        Ok(path)
    }

    /// Build the public URL for a remote path; each segment is percent-encoded.
    fn generate_url(&self, remote_path: &str) -> String {
        let encoded: Vec<String> = remote_path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// `name.ext` -> `name (n).ext`
fn autorenamed(name: &str, attempt: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, attempt, ext),
        _ => format!("{} ({})", name, attempt),
    }
}

fn split_remote(remote_path: &str) -> StoreResult<(&str, &str)> {
    remote_path
        .rsplit_once('/')
        .filter(|(_, name)| !name.is_empty())
        .ok_or_else(|| StoreError::InvalidPath(format!("{} has no file name", remote_path)))
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn ensure_folder(&self, path: &str) -> StoreResult<FolderStatus> {
        let dir = self.remote_to_fs(path)?;
        self.ensure_parent_dir(&dir).await?;

        match fs::create_dir(&dir).await {
            Ok(()) => {
                tracing::info!(folder = %path, dir = %dir.display(), "Local folder created");
                Ok(FolderStatus::Created)
            }
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                if fs::metadata(&dir).await?.is_dir() {
                    Ok(FolderStatus::AlreadyExists)
                } else {
                    Err(StoreError::InvalidPath(format!(
                        "{} exists and is not a folder",
                        path
                    )))
                }
            }
            Err(e) => Err(StoreError::IoError(e)),
        }
    }

    async fn commit(&self, path: &str, data: Bytes) -> StoreResult<CommitMetadata> {
        let (folder, requested) = split_remote(path)?;
        let target = self.remote_to_fs(path)?;
        self.ensure_parent_dir(&target).await?;
        let dir = target
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(format!("{} has no parent folder", path)))?;

        let start = std::time::Instant::now();

        // Staged under a hidden name; the TempPath removes it if this future is dropped
        // before the clip is published.
        let (file, mut staged) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(dir)?
            .into_parts();
        let mut file = fs::File::from_std(file);
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        let mut name = requested.to_string();
        let mut attempt = 0;
        let fs_path = loop {
            let candidate = target.with_file_name(&name);
            match staged.persist_noclobber(&candidate) {
                Ok(()) => break candidate,
                Err(e) if e.error.kind() == IoErrorKind::AlreadyExists => {
                    staged = e.path;
                    attempt += 1;
                    if attempt > MAX_AUTORENAME_ATTEMPTS {
                        return Err(StoreError::Api {
                            status: 409,
                            summary: format!("path/conflict/file: no free name for {}", path),
                            payload: None,
                        });
                    }
                    name = autorenamed(requested, attempt);
                }
                Err(e) => return Err(StoreError::IoError(e.error)),
            }
        };

        let canonical = format!("{}/{}", folder, name);

        tracing::info!(
            path = %fs_path.display(),
            remote_path = %canonical,
            renamed = attempt > 0,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store commit successful"
        );

        Ok(CommitMetadata {
            name,
            path: canonical,
            id: None,
            size: data.len() as u64,
            rev: None,
            content_hash: None,
            server_modified: Some(Utc::now()),
        })
    }

    async fn list(&self, folder: &str) -> StoreResult<Vec<RemoteEntry>> {
        let dir = self.remote_to_fs(folder)?;

        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::IoError(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if name.starts_with(STAGING_PREFIX) {
                continue;
            }
            let path = format!("{}/{}", folder.trim_end_matches('/'), name);
            entries.push(RemoteEntry::new(name, path));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    async fn resolve_link(&self, path: &str) -> StoreResult<String> {
        let fs_path = self.remote_to_fs(path)?;
        if !fs::try_exists(&fs_path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(self.generate_url(path))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
