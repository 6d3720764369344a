#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use axum::Router;
use axum_test::TestServer;
use clipvault_api::setup::routes;
use clipvault_api::AppState;
use clipvault_core::Config;
use clipvault_storage::LocalStore;
use fakes::{FakeTranscoder, FaultyStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Base URL the local store hands out; its path is mounted by the router.
pub const FILES_BASE_URL: &str = "http://localhost/files";

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    /// The same app as `server`, for driving requests by hand.
    pub router: Router,
    pub store: Arc<FaultyStore>,
    pub transcoder: Arc<FakeTranscoder>,
    pub storage_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files still sitting in the temporary upload directory.
    pub fn leftover_uploads(&self) -> Vec<PathBuf> {
        list_dir(&self.upload_dir)
    }

    /// Files committed to the archive folder on disk.
    pub fn archived_files(&self) -> Vec<PathBuf> {
        list_dir(&self.storage_dir.join("audio"))
    }
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Setup a test application backed by a local store in a fresh temp directory
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Same as `setup_test_app`, with a hook to adjust the configuration first.
pub async fn setup_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_dir = temp_dir.path().join("store");
    let upload_dir = temp_dir.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).expect("Failed to create upload directory");

    let mut config = Config::local(&storage_dir, FILES_BASE_URL);
    config.processing.upload_dir = upload_dir.clone();
    configure(&mut config);
    config.validate().expect("Test configuration should be valid");

    let local = LocalStore::new(&storage_dir, FILES_BASE_URL.to_string())
        .await
        .expect("Failed to create local store");
    let store = Arc::new(FaultyStore::new(local));
    let transcoder = Arc::new(FakeTranscoder::new(upload_dir.clone()));

    let state = Arc::new(
        AppState::new(config.clone(), store.clone(), transcoder.clone())
            .expect("Failed to build app state"),
    );

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server =
        TestServer::new(app.clone().into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        router: app,
        store,
        transcoder,
        storage_dir,
        upload_dir,
        _temp_dir: temp_dir,
    }
}
