//! Tests for uploads and downloads.

use std::sync::Arc;

use courier_core::codes;
use courier_net::{ApiManager, FileUpload, Parameters, SIGNATURE_FIELD, TransferProgress};
use parking_lot::Mutex;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server: &MockServer) -> ApiManager {
    ApiManager::builder(server.uri())
        .error_domain("com.example.api")
        .signing_secret("s3cret")
        .login_token("tok")
        .build()
        .expect("Failed to build manager")
}

#[tokio::test]
async fn test_upload_is_signed_and_reports_progress() {
    let server = MockServer::start().await;
    let api = manager(&server);

    let mut params = Parameters::new();
    params.insert("kind".into(), Value::from("avatar"));
    let signature = api.create_signature(
        "/upload",
        &api.params_with_session(&params),
        "me.txt",
        "file",
    );

    let contents = "x".repeat(150 * 1024);
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(format!("name=\"{SIGNATURE_FIELD}\"")))
        .and(body_string_contains(signature.clone()))
        .and(body_string_contains("name=\"kind\""))
        .and(body_string_contains("filename=\"me.txt\""))
        .and(body_string_contains("text/plain"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"url": "/files/1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let progress: Arc<Mutex<Vec<TransferProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = progress.clone();
    let upload = FileUpload::new("file", "me.txt", contents.clone().into_bytes()).mime_type("text/plain");

    let payload = api
        .upload_file("/upload", &params, upload, move |p| sink.lock().push(p))
        .await
        .expect("upload failed");

    assert_eq!(payload.get("data"), Some(&json!({"url": "/files/1"})));

    let progress = progress.lock();
    let last = progress.last().expect("no progress reported");
    assert_eq!(last.bytes_transferred, contents.len() as u64);
    assert_eq!(last.total_bytes, Some(contents.len() as u64));
    assert!(progress.windows(2).all(|w| w[0].bytes_transferred <= w[1].bytes_transferred));
}

#[tokio::test]
async fn test_upload_error_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error_code": 31, "error_message": "Bad signature"})),
        )
        .mount(&server)
        .await;

    let error = manager(&server)
        .upload_file(
            "/upload",
            &Parameters::new(),
            FileUpload::new("file", "a.bin", vec![0u8; 16]),
            |_| {},
        )
        .await
        .unwrap_err();

    assert_eq!(error.code(), 31);
    assert_eq!(error.message(), "Bad signature");
}

#[tokio::test]
async fn test_download_writes_exact_body() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/files/board.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let mut buffer = Vec::new();
    let mut last = None;
    let written = manager(&server)
        .download_file("/files/board.bin", &mut buffer, |p| last = Some(p))
        .await
        .expect("download failed");

    assert_eq!(written, body.len() as u64);
    assert_eq!(buffer, body);
    assert_eq!(
        last.map(|p| p.bytes_transferred),
        Some(body.len() as u64)
    );
}

#[tokio::test]
async fn test_download_absolute_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdn/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNG".to_vec()))
        .mount(&server)
        .await;

    let api = ApiManager::builder("http://api.invalid")
        .build()
        .expect("Failed to build manager");

    let mut buffer = Vec::new();
    api.download_file(&format!("{}/cdn/logo.png", server.uri()), &mut buffer, |_| {})
        .await
        .expect("download failed");
    assert_eq!(buffer, b"PNG");
}

#[tokio::test]
async fn test_download_to_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1. e4 e5"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let target = dir.path().join("notes.txt");

    let written = manager(&server)
        .download_to_path("/files/notes.txt", &target, |_| {})
        .await
        .expect("download failed");

    assert_eq!(written, 8);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "1. e4 e5");
}

#[tokio::test]
async fn test_failed_download_creates_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let target = dir.path().join("gone.txt");

    let error = manager(&server)
        .download_to_path("/files/gone.txt", &target, |_| {})
        .await
        .unwrap_err();

    assert_eq!(error.code(), 404);
    assert!(!target.exists());
}

#[tokio::test]
async fn test_download_into_missing_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let target = dir.path().join("missing").join("a.txt");

    let error = manager(&server)
        .download_to_path("/files/a.txt", &target, |_| {})
        .await
        .unwrap_err();
    assert_eq!(error.code(), codes::IO);
}
