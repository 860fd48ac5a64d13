//! End-to-end tests for the upload surface against an in-memory router with
//! a scripted storage adapter (no network, no real Drive).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use fotodrop_api::{build_router, AppState};
use fotodrop_core::{Config, StagedFile, UploadResponse, UploadedFile};
use fotodrop_drive::{RemoteStorage, StorageError, StorageResult};
use tower::ServiceExt;

/// Storage stub: authorization and per-name failures are scripted per test.
struct ScriptedStorage {
    authorized: bool,
    auth_url: Option<String>,
    fail_names: Vec<&'static str>,
    upload_calls: AtomicUsize,
}

impl ScriptedStorage {
    fn authorized() -> Self {
        ScriptedStorage {
            authorized: true,
            auth_url: None,
            fail_names: Vec::new(),
            upload_calls: AtomicUsize::new(0),
        }
    }

    fn unauthorized_oauth() -> Self {
        ScriptedStorage {
            authorized: false,
            auth_url: Some("https://accounts.google.com/o/oauth2/v2/auth?client_id=x".into()),
            fail_names: Vec::new(),
            upload_calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(names: Vec<&'static str>) -> Self {
        ScriptedStorage {
            fail_names: names,
            ..ScriptedStorage::authorized()
        }
    }
}

#[async_trait]
impl RemoteStorage for ScriptedStorage {
    async fn is_authorized(&self) -> bool {
        self.authorized
    }

    async fn auth_url(&self) -> Option<StorageResult<String>> {
        self.auth_url.clone().map(Ok)
    }

    async fn complete_authorization(&self, _code: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn upload(&self, staged: &StagedFile) -> StorageResult<UploadedFile> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let name = staged.original_name();
        if self.fail_names.contains(&name) {
            return Err(StorageError::Backend(
                "HTTP 403: The user does not have sufficient permissions for this folder".into(),
            ));
        }
        Ok(UploadedFile {
            name: name.to_string(),
            id: format!("drive-{}", name),
            web_view_link: Some(format!("https://drive.example/view/{}", name)),
        })
    }
}

struct TestApp {
    router: axum::Router,
    storage: Arc<ScriptedStorage>,
    uploads_dir: tempfile::TempDir,
}

fn test_app(storage: ScriptedStorage) -> TestApp {
    let uploads_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(storage);
    let config = Config::for_tests(uploads_dir.path().to_path_buf());
    let state = Arc::new(AppState::new(config, storage.clone()));
    TestApp {
        router: build_router(state),
        storage,
        uploads_dir,
    }
}

const BOUNDARY: &str = "test-boundary-7f9a2c";

fn multipart_body(files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(files: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn uploads_dir_is_empty(app: &TestApp) -> bool {
    std::fs::read_dir(app.uploads_dir.path()).unwrap().count() == 0
}

#[tokio::test]
async fn batch_of_three_images_all_succeed() {
    let app = test_app(ScriptedStorage::authorized());

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[
            ("one.jpg", "image/jpeg", b"aaa"),
            ("two.png", "image/png", b"bbb"),
            ("three.gif", "image/gif", b"ccc"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UploadResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert!(body.success);
    assert_eq!(body.uploaded.len(), 3);
    assert!(body.errors.is_empty());
    assert!(body.message.contains('3'));
    assert_eq!(body.uploaded[0].name, "one.jpg");
    assert!(body.uploaded[0]
        .web_view_link
        .as_deref()
        .unwrap()
        .contains("one.jpg"));
    assert!(uploads_dir_is_empty(&app));
}

#[tokio::test]
async fn partial_failure_names_the_failing_file_and_still_returns_200() {
    let app = test_app(ScriptedStorage::failing_on(vec!["huge.mov"]));

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[
            ("fine.jpg", "image/jpeg", b"aaa"),
            ("huge.mov", "video/quicktime", b"bbb"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UploadResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert!(body.success);
    assert_eq!(body.uploaded.len(), 1);
    assert_eq!(body.errors.len(), 1);
    assert_eq!(body.errors[0].name, "huge.mov");
    assert!(body.errors[0].error.contains("permissions"));
    assert!(uploads_dir_is_empty(&app));
}

#[tokio::test]
async fn disallowed_type_rejects_the_request_before_any_dispatch() {
    let app = test_app(ScriptedStorage::authorized());

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[(
            "contract.pdf",
            "application/pdf",
            b"%PDF-",
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.storage.upload_calls.load(Ordering::SeqCst), 0);
    assert!(uploads_dir_is_empty(&app));
}

#[tokio::test]
async fn mixed_valid_and_disallowed_rejects_the_whole_request() {
    let app = test_app(ScriptedStorage::authorized());

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[
            ("fine.jpg", "image/jpeg", b"aaa"),
            ("tool.exe", "application/octet-stream", b"MZ"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.storage.upload_calls.load(Ordering::SeqCst), 0);
    // The already-staged valid file must not leak.
    assert!(uploads_dir_is_empty(&app));
}

#[tokio::test]
async fn empty_batch_is_a_bad_request() {
    let app = test_app(ScriptedStorage::authorized());

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eleventh_file_rejects_the_batch() {
    let app = test_app(ScriptedStorage::authorized());

    let files: Vec<(String, &str)> = (0..11).map(|i| (format!("f{}.jpg", i), "image/jpeg")).collect();
    let borrowed: Vec<(&str, &str, &[u8])> = files
        .iter()
        .map(|(n, t)| (n.as_str(), *t, b"x".as_slice()))
        .collect();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&borrowed))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.storage.upload_calls.load(Ordering::SeqCst), 0);
    assert!(uploads_dir_is_empty(&app));
}

#[tokio::test]
async fn unauthorized_oauth_store_returns_401_and_forwards_nothing() {
    let app = test_app(ScriptedStorage::unauthorized_oauth());

    let response = app
        .router
        .clone()
        .oneshot(upload_request(&[("one.jpg", "image/jpeg", b"aaa")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "authorization_required");
    assert!(body["authUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://accounts.google.com/"));
    assert_eq!(app.storage.upload_calls.load(Ordering::SeqCst), 0);
    assert!(uploads_dir_is_empty(&app));
}

#[tokio::test]
async fn auth_status_reflects_the_credential_store() {
    let app = test_app(ScriptedStorage::unauthorized_oauth());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth-status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["authorized"], false);
}

#[tokio::test]
async fn qr_url_returns_the_upload_page_base() {
    let app = test_app(ScriptedStorage::authorized());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/qr-url")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["url"].as_str().unwrap().starts_with("http"));
}
