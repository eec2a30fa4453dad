//! End-to-end tests for `POST /upload`
//!
//! Requests are driven through the router with `oneshot`, so no socket is bound.

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{manifest, CountingBackend};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use trailer_graph::backend::{BackendError, BackendResult, GraphBackend, GraphTransaction};
use trailer_graph::graph::Label;
use trailer_graph::ingest::ShipmentRow;
use trailer_graph::{router, schema, AppState, ServerConfig};

const BOUNDARY: &str = "----trailer-graph-test-boundary";

struct TestApp {
    app: Router,
    backend: Arc<CountingBackend>,
    staging_dir: PathBuf,
    _tmp: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let staging_dir = tmp.path().join("import");
        let config = ServerConfig {
            staging_dir: staging_dir.clone(),
            ..ServerConfig::default()
        };

        let backend = Arc::new(CountingBackend::default());
        let shared: Arc<dyn GraphBackend> = backend.clone();
        let state = Arc::new(AppState::new(shared, &config));

        Self {
            app: router(state, &config),
            backend,
            staging_dir,
            _tmp: tmp,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }
}

/// One form part: (field name, optional filename, content)
fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                name, file_name
            )),
            None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn upload(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

#[tokio::test]
async fn test_upload_stages_file_and_builds_graph() {
    let app = TestApp::new();
    let csv = manifest(&["T1,S1,C1,P1,5", "T1,S2,C2,P2,3"]);

    let (status, body) = app
        .send(upload(&[("note", None, "ignored"), ("file", Some("manifest.csv"), &csv)]))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body.starts_with("File manifest.csv uploaded successfully to "), "{}", body);
    assert!(body.contains("manifest.csv"));

    let staged = tokio::fs::read_to_string(app.staging_dir.join("manifest.csv")).await.unwrap();
    assert_eq!(staged, csv);

    assert_eq!(app.backend.sessions_opened(), 1);
    let store = app.backend.inner.store().read().await;
    assert_eq!(store.count_label(&Label::new(schema::TRAILER)), 1);
    assert_eq!(store.count_label(&Label::new(schema::SID)), 2);
    assert_eq!(store.count_label(&Label::new(schema::SCHEDULE)), 1);
}

#[tokio::test]
async fn test_missing_file_field_is_rejected_before_any_work() {
    let app = TestApp::new();

    let (status, body) = app.send(upload(&[("other", None, "value")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing form field 'file'"), "{}", body);
    assert!(!app.staging_dir.exists());
    assert_eq!(app.backend.sessions_opened(), 0);
}

#[tokio::test]
async fn test_non_multipart_request_is_rejected() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.sessions_opened(), 0);
}

#[tokio::test]
async fn test_unsafe_filename_is_rejected() {
    let app = TestApp::new();
    let csv = manifest(&["T1,S1,C1,P1,5"]);

    for name in ["bad'name.csv", "../escape.csv"] {
        let (status, body) = app.send(upload(&[("file", Some(name), &csv)])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", name, body);
    }

    assert!(!app.staging_dir.exists());
    assert_eq!(app.backend.sessions_opened(), 0);
}

#[tokio::test]
async fn test_bad_quantity_returns_422_and_leaves_graph_empty() {
    let app = TestApp::new();
    let csv = manifest(&["T1,S1,C1,P1,5", "T2,S2,C2,P2,abc"]);

    let (status, body) = app.send(upload(&[("file", Some("broken.csv"), &csv)])).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("line 3"), "{}", body);
    // Staged, but never ingested
    assert!(app.staging_dir.join("broken.csv").exists());
    assert_eq!(app.backend.sessions_opened(), 0);
    assert_eq!(app.backend.inner.store().read().await.node_count(), 0);
}

#[tokio::test]
async fn test_reupload_overwrites_staged_file() {
    let app = TestApp::new();
    let first = manifest(&["T1,S1,C1,P1,5"]);
    let second = manifest(&["T2,S2,C2,P2,1"]);

    let (status, _) = app.send(upload(&[("file", Some("daily.csv"), &first)])).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(upload(&[("file", Some("daily.csv"), &second)])).await;
    assert_eq!(status, StatusCode::OK);

    let staged = tokio::fs::read_to_string(app.staging_dir.join("daily.csv")).await.unwrap();
    assert_eq!(staged, second);
    let store = app.backend.inner.store().read().await;
    assert_eq!(store.count_label(&Label::new(schema::TRAILER)), 2);
}

/// Backend whose transactions never finish linking shipments
struct Stalled;

struct StalledTransaction;

#[async_trait]
impl GraphTransaction for StalledTransaction {
    async fn link_shipments(&mut self, _: &[ShipmentRow]) -> BackendResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn link_cisco(&mut self, _: &[ShipmentRow]) -> BackendResult<()> {
        Ok(())
    }

    async fn backfill_schedules(&mut self) -> BackendResult<u64> {
        Ok(0)
    }

    async fn materialize_contains_part(&mut self) -> BackendResult<u64> {
        Ok(0)
    }

    async fn commit(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }
}

#[async_trait]
impl GraphBackend for Stalled {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>> {
        Ok(Box::new(StalledTransaction))
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        Ok(())
    }
}

/// Stalled backend behind the router; returns (status, body)
async fn upload_to_stalled(config: ServerConfig) -> (StatusCode, String) {
    let app = router(Arc::new(AppState::new(Arc::new(Stalled), &config)), &config);
    let csv = manifest(&["T1,S1,C1,P1,5"]);

    let response = app
        .oneshot(upload(&[("file", Some("manifest.csv"), &csv)]))
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_stalled_graph_reports_ingestion_timeout_with_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = ServerConfig {
        staging_dir: tmp.path().to_path_buf(),
        ..ServerConfig::default()
    };

    let (status, body) = upload_to_stalled(config).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, "Timed out during ingestion");
}

#[tokio::test(start_paused = true)]
async fn test_request_deadline_answers_in_plain_text() {
    let tmp = TempDir::new().unwrap();
    let config = ServerConfig {
        staging_dir: tmp.path().to_path_buf(),
        request_timeout_secs: 5,
        graph_timeout_secs: 60,
        ..ServerConfig::default()
    };

    let (status, body) = upload_to_stalled(config).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, "Timed out during request");
}

struct Unreachable;

#[async_trait]
impl GraphBackend for Unreachable {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>> {
        Err(BackendError::Store("connection refused".into()))
    }

    async fn ping(&self) -> BackendResult<()> {
        Err(BackendError::Store("connection refused".into()))
    }

    async fn close(&self) -> BackendResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unreachable_graph_store() {
    let tmp = TempDir::new().unwrap();
    let config = ServerConfig {
        staging_dir: tmp.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let app = router(Arc::new(AppState::new(Arc::new(Unreachable), &config)), &config);

    let csv = manifest(&["T1,S1,C1,P1,5"]);
    let response = app
        .oneshot(upload(&[("file", Some("manifest.csv"), &csv)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_only_upload_route_exists() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
