//! In-process stand-ins for ffmpeg and for remote store failures.

use async_trait::async_trait;
use bytes::Bytes;
use clipvault_core::{AudioFormat, CommitMetadata, RemoteEntry, StorageBackend};
use clipvault_processing::{TempArtifact, TranscodeError, Transcoder};
use clipvault_storage::{FolderStatus, LocalStore, RemoteStore, StoreError, StoreResult};
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Prefixes the input with an ID3 tag instead of running ffmpeg.
pub struct FakeTranscoder {
    work_dir: PathBuf,
    calls: AtomicUsize,
    fail: AtomicBool,
    hang: AtomicBool,
    started: Notify,
}

impl FakeTranscoder {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            hang: AtomicBool::new(false),
            started: Notify::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Every later transcode creates its output file and then never returns.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    /// Resolves once a transcode has created its output file.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &TempArtifact,
        _source: AudioFormat,
        target: AudioFormat,
    ) -> Result<TempArtifact, TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let output = TempArtifact::create_in(
            &self.work_dir,
            &format!(".{}", target.extension()),
            "transcoded",
        )
        .await?;

        if self.hang.load(Ordering::SeqCst) {
            self.started.notify_one();
            std::future::pending::<()>().await;
        }

        if self.fail.swap(false, Ordering::SeqCst) {
            output.release().await?;
            return Err(TranscodeError::Failed {
                status: "exit status: 1".to_string(),
                stderr_tail: "Invalid data found when processing input".to_string(),
            });
        }

        let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
        data.extend_from_slice(&input.read_all().await?);
        output.write_all(&data).await?;
        Ok(output)
    }
}

/// Wraps a `LocalStore`, counting calls and failing on demand.
pub struct FaultyStore {
    inner: LocalStore,
    calls: AtomicUsize,
    folder_calls: AtomicUsize,
    fail_commit: AtomicBool,
    hang_commit: AtomicBool,
    fail_list: AtomicBool,
    broken_links: Mutex<HashSet<String>>,
}

impl FaultyStore {
    pub fn new(inner: LocalStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            folder_calls: AtomicUsize::new(0),
            fail_commit: AtomicBool::new(false),
            hang_commit: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            broken_links: Mutex::new(HashSet::new()),
        }
    }

    /// Total calls of any store operation.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn folder_calls(&self) -> usize {
        self.folder_calls.load(Ordering::SeqCst)
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Commits never complete.
    pub fn hang_commits(&self, hang: bool) {
        self.hang_commit.store(hang, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Link resolution for the entry stored under `name` will fail.
    pub fn break_link(&self, name: &str) {
        self.broken_links
            .lock()
            .expect("broken_links poisoned")
            .insert(name.to_string());
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn api_error(status: u16, summary: &str) -> StoreError {
    StoreError::Api {
        status,
        summary: summary.to_string(),
        payload: Some(json!({ "error_summary": summary })),
    }
}

#[async_trait]
impl RemoteStore for FaultyStore {
    async fn ensure_folder(&self, path: &str) -> StoreResult<FolderStatus> {
        self.record();
        self.folder_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.ensure_folder(path).await
    }

    async fn commit(&self, path: &str, data: Bytes) -> StoreResult<CommitMetadata> {
        self.record();
        if self.hang_commit.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(api_error(409, "path/insufficient_space/.."));
        }
        self.inner.commit(path, data).await
    }

    async fn list(&self, folder: &str) -> StoreResult<Vec<RemoteEntry>> {
        self.record();
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(api_error(500, "internal_error/.."));
        }
        self.inner.list(folder).await
    }

    async fn resolve_link(&self, path: &str) -> StoreResult<String> {
        self.record();
        let name = path.rsplit('/').next().unwrap_or(path);
        let broken = self
            .broken_links
            .lock()
            .expect("broken_links poisoned")
            .contains(name);
        if broken {
            return Err(api_error(409, "path/not_found/.."));
        }
        self.inner.resolve_link(path).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
