mod helpers;

use axum::body::Body;
use axum::http::{header, Request};
use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use helpers::fixtures::{create_test_mp3, create_test_wav, multipart_body, BOUNDARY};
use helpers::{setup_test_app, setup_test_app_with, FILES_BASE_URL};
use std::time::Duration;
use tower::ServiceExt;

fn audio_form(data: Vec<u8>, file_name: &str, mime: &str) -> MultipartForm {
    let part = Part::bytes(Bytes::from(data))
        .file_name(file_name)
        .mime_type(mime);
    MultipartForm::new().add_part("audio", part)
}

#[tokio::test]
async fn test_upload_wav_is_transcoded_and_archived() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(audio_form(create_test_wav(10 * 1024), "memo.wav", "audio/wav"))
        .await;

    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["message"], "File uploaded successfully!");
    assert_eq!(data["storedMetadata"]["name"], "Clip #0001.mp3");
    assert_eq!(data["storedMetadata"]["path"], "/audio/Clip #0001.mp3");
    assert_eq!(app.transcoder.calls(), 1);
    assert!(app.leftover_uploads().is_empty());

    let archive = client.get("/archive").await;
    assert_eq!(archive.status_code(), 200);
    let listing: serde_json::Value = archive.json();
    let entries = listing["entries"].as_array().expect("entries array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "Clip #0001");
    assert!(!entries[0]["link"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_upload_mp3_skips_transcode_and_is_served() {
    let app = setup_test_app().await;
    let client = app.client();
    let original = create_test_mp3(4096);

    let response = client
        .post("/upload")
        .multipart(audio_form(original.clone(), "song.mp3", "audio/mpeg"))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(app.transcoder.calls(), 0);

    let listing: serde_json::Value = client.get("/archive").await.json();
    let link = listing["entries"][0]["link"]
        .as_str()
        .expect("link should be a string")
        .to_string();
    let path = link
        .strip_prefix("http://localhost")
        .expect("link should use the local base url");
    assert!(link.starts_with(FILES_BASE_URL));

    let served = client.get(path).await;
    assert_eq!(served.status_code(), 200);
    assert_eq!(served.header("content-type"), "audio/mpeg");
    assert_eq!(served.as_bytes().as_ref(), original.as_slice());
}

#[tokio::test]
async fn test_upload_rejects_non_audio_before_touching_store() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(audio_form(b"just some notes".to_vec(), "notes.txt", "text/plain"))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "validation");
    assert!(data["message"].as_str().is_some());
    assert_eq!(app.store.calls(), 0);
    assert_eq!(app.transcoder.calls(), 0);
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_upload_without_audio_field_fails_validation() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = MultipartForm::new().add_text("title", "no file here");
    let response = client.post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "validation");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_commit_failure_reports_upload_error_and_cleans_up() {
    let app = setup_test_app().await;
    let client = app.client();
    app.store.fail_commits(true);

    let response = client
        .post("/upload")
        .multipart(audio_form(create_test_wav(2048), "memo.wav", "audio/wav"))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "upload");
    assert_eq!(
        data["error"]["payload"]["error_summary"],
        "path/insufficient_space/.."
    );
    assert_eq!(app.transcoder.calls(), 1);
    assert!(app.leftover_uploads().is_empty());
    assert!(app.archived_files().is_empty());
}

#[tokio::test]
async fn test_transcode_failure_stops_before_store() {
    let app = setup_test_app().await;
    let client = app.client();
    app.transcoder.fail_next();

    let response = client
        .post("/upload")
        .multipart(audio_form(create_test_wav(2048), "memo.wav", "audio/wav"))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "transcode");
    assert_eq!(app.store.calls(), 0);
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_sequential_uploads_get_increasing_ordinals() {
    let app = setup_test_app().await;
    let client = app.client();

    for expected in ["Clip #0001.mp3", "Clip #0002.mp3"] {
        let response = client
            .post("/upload")
            .multipart(audio_form(create_test_mp3(1024), "take.mp3", "audio/mpeg"))
            .await;
        assert_eq!(response.status_code(), 200);
        let data: serde_json::Value = response.json();
        assert_eq!(data["storedMetadata"]["name"], expected);
    }

    assert_eq!(app.archived_files().len(), 2);
}

#[tokio::test]
async fn test_oversized_uploads_fail_validation() {
    let app = setup_test_app_with(|config| {
        config.processing.max_audio_size_bytes = 1024 * 1024;
    })
    .await;
    let client = app.client();

    // Just over the file limit, then past the request body limit as well.
    for data_len in [1024 * 1024 + 10, 1024 * 1024 + 200 * 1024] {
        let response = client
            .post("/upload")
            .multipart(audio_form(create_test_wav(data_len), "long.wav", "audio/wav"))
            .await;

        assert_eq!(response.status_code(), 500);
        let data: serde_json::Value = response.json();
        assert_eq!(data["error"]["kind"], "validation");
    }

    assert_eq!(app.store.calls(), 0);
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_transcode_timeout_fails_and_cleans_up() {
    let app = setup_test_app_with(|config| {
        config.processing.transcode_timeout_secs = 1;
    })
    .await;
    app.transcoder.hang();

    let response = app
        .client()
        .post("/upload")
        .multipart(audio_form(create_test_wav(2048), "memo.wav", "audio/wav"))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "transcode");
    assert_eq!(app.store.calls(), 0);
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_commit_timeout_fails_and_cleans_up() {
    let app = setup_test_app_with(|config| {
        config.store.store_timeout_secs = 1;
    })
    .await;
    app.store.hang_commits(true);

    let response = app
        .client()
        .post("/upload")
        .multipart(audio_form(create_test_wav(2048), "memo.wav", "audio/wav"))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"]["kind"], "upload");
    assert!(app.leftover_uploads().is_empty());
    assert!(app.archived_files().is_empty());
}

#[tokio::test]
async fn test_dropped_request_releases_temporary_files() {
    let app = setup_test_app().await;
    app.transcoder.hang();

    let body = multipart_body("audio", "memo.wav", "audio/wav", &create_test_wav(4096));
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("valid request");

    let in_flight = tokio::spawn(app.router.clone().oneshot(request));
    tokio::time::timeout(Duration::from_secs(5), app.transcoder.wait_started())
        .await
        .expect("transcode should start");

    // Buffered upload plus the transcoder's output.
    assert_eq!(app.leftover_uploads().len(), 2);

    in_flight.abort();
    assert!(in_flight.await.is_err());

    assert!(app.leftover_uploads().is_empty());
    assert_eq!(app.store.calls(), 0);
}
