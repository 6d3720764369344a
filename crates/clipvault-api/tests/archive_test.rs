mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use helpers::fixtures::create_test_mp3;
use helpers::setup_test_app;

async fn upload_mp3(client: &TestServer) -> serde_json::Value {
    let part = Part::bytes(Bytes::from(create_test_mp3(1024)))
        .file_name("take.mp3")
        .mime_type("audio/mpeg");
    let response = client
        .post("/upload")
        .multipart(MultipartForm::new().add_part("audio", part))
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

fn entry_names(listing: &serde_json::Value) -> Vec<String> {
    listing["entries"]
        .as_array()
        .expect("entries array")
        .iter()
        .map(|e| e["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_archive_of_missing_folder_is_empty() {
    let app = setup_test_app().await;

    let response = app.client().get("/archive").await;

    assert_eq!(response.status_code(), 200);
    let listing: serde_json::Value = response.json();
    assert!(entry_names(&listing).is_empty());
}

#[tokio::test]
async fn test_archive_drops_entries_whose_link_fails() {
    let app = setup_test_app().await;
    let client = app.client();
    for _ in 0..3 {
        upload_mp3(client).await;
    }
    app.store.break_link("Clip #0002.mp3");

    let response = client.get("/archive").await;

    assert_eq!(response.status_code(), 200);
    let listing: serde_json::Value = response.json();
    assert_eq!(entry_names(&listing), vec!["Clip #0001", "Clip #0003"]);
    for entry in listing["entries"].as_array().expect("entries array") {
        assert!(entry["link"]
            .as_str()
            .is_some_and(|link| link.starts_with("http://localhost/files/audio/")));
    }
}

#[tokio::test]
async fn test_archive_sorts_by_ordinal_not_by_name() {
    let app = setup_test_app().await;
    let folder = app.storage_dir.join("audio");
    std::fs::create_dir_all(&folder).expect("create archive folder");
    for name in ["Clip #10.mp3", "Clip #9.mp3", "Clip #0002.wav", "notes.mp3"] {
        std::fs::write(folder.join(name), b"ID3").expect("seed archive file");
    }

    let listing: serde_json::Value = app.client().get("/archive").await.json();

    assert_eq!(
        entry_names(&listing),
        vec!["notes", "Clip #0002", "Clip #9", "Clip #10"]
    );
}

#[tokio::test]
async fn test_archive_list_failure_is_reported() {
    let app = setup_test_app().await;
    app.store.fail_lists(true);

    let response = app.client().get("/archive").await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "list");
    assert_eq!(data["error"]["payload"]["error_summary"], "internal_error/..");
}

#[tokio::test]
async fn test_folder_creation_is_idempotent_across_uploads() {
    let app = setup_test_app().await;
    let client = app.client();

    upload_mp3(client).await;
    upload_mp3(client).await;

    assert_eq!(app.store.folder_calls(), 2);
    assert_eq!(app.archived_files().len(), 2);

    let listing: serde_json::Value = client.get("/archive").await.json();
    assert_eq!(entry_names(&listing), vec!["Clip #0001", "Clip #0002"]);
}

#[tokio::test]
async fn test_display_label_is_prepended() {
    let app = helpers::setup_test_app_with(|config| {
        config.naming.display_label = Some("🎵".to_string());
    })
    .await;
    upload_mp3(app.client()).await;

    let listing: serde_json::Value = app.client().get("/archive").await.json();

    assert_eq!(entry_names(&listing), vec!["🎵 Clip #0001"]);
}
