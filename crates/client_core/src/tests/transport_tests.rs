use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CapturedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

type Captured = Arc<Mutex<Vec<CapturedPart>>>;

async fn spawn_server(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn capture_upload(
    State(captured): State<Captured>,
    mut multipart: Multipart,
) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.expect("field bytes").to_vec();
        captured.lock().await.push(CapturedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    Json(json!({ "message": "PDF uploaded and processed successfully" }))
}

async fn echo_question(Json(request): Json<AskRequest>) -> Json<Value> {
    Json(json!({ "answer": format!("You asked: {}", request.question) }))
}

async fn spawn_healthy_backend() -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route("/upload", post(capture_upload))
        .route("/ask", post(echo_question))
        .with_state(captured.clone());
    let url = spawn_server(app).await.expect("spawn server");
    (url, captured)
}

async fn spawn_failing_backend() -> String {
    let app = Router::new()
        .route(
            "/health",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "detail": "warming up" })),
                )
            }),
        )
        .route(
            "/upload",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "detail": "File must be a PDF" })),
                )
            }),
        )
        .route(
            "/ask",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        );
    spawn_server(app).await.expect("spawn server")
}

async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn rejects_unparseable_server_url() {
    assert!(HttpQaBackend::new("not a url").is_err());
}

#[test]
fn endpoints_ignore_trailing_slash() {
    let backend = HttpQaBackend::new("http://localhost:8000/").expect("url");
    assert_eq!(backend.endpoint("ask"), "http://localhost:8000/ask");
}

#[tokio::test]
async fn health_accepts_any_json_body() {
    let (url, _) = spawn_healthy_backend().await;
    let backend = HttpQaBackend::new(&url).expect("backend");

    backend.health().await.expect("healthy");
}

#[tokio::test]
async fn health_rejects_non_success_status() {
    let url = spawn_failing_backend().await;
    let backend = HttpQaBackend::new(&url).expect("backend");

    assert_eq!(
        backend.health().await,
        Err(RequestError::Backend {
            status: 503,
            detail: Some("warming up".into()),
        })
    );
}

#[tokio::test]
async fn health_rejects_non_json_body() {
    let app = Router::new().route("/health", get(|| async { "ok" }));
    let url = spawn_server(app).await.expect("spawn server");
    let backend = HttpQaBackend::new(&url).expect("backend");

    assert!(matches!(
        backend.health().await,
        Err(RequestError::Transport(_))
    ));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let backend = HttpQaBackend::new(&unreachable_url().await).expect("backend");

    assert!(matches!(
        backend.health().await,
        Err(RequestError::Transport(_))
    ));
    assert!(matches!(
        backend.ask("hello?").await,
        Err(RequestError::Transport(_))
    ));
}

#[tokio::test]
async fn upload_sends_single_file_part() {
    let (url, captured) = spawn_healthy_backend().await;
    let backend = HttpQaBackend::new(&url).expect("backend");
    let document = Document::new("doc.pdf", b"%PDF-1.4 body".to_vec());

    let response = backend.upload(&document).await.expect("upload");

    assert_eq!(response.message, "PDF uploaded and processed successfully");
    assert_eq!(
        *captured.lock().await,
        vec![CapturedPart {
            name: UPLOAD_FIELD_NAME.to_string(),
            file_name: Some("doc.pdf".into()),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.4 body".to_vec(),
        }]
    );
}

#[tokio::test]
async fn upload_error_carries_backend_detail() {
    let url = spawn_failing_backend().await;
    let backend = HttpQaBackend::new(&url).expect("backend");

    let result = backend
        .upload(&Document::new("doc.pdf", b"%PDF".to_vec()))
        .await;

    assert_eq!(
        result,
        Err(RequestError::Backend {
            status: 400,
            detail: Some("File must be a PDF".into()),
        })
    );
}

#[tokio::test]
async fn ask_posts_question_json() {
    let (url, _) = spawn_healthy_backend().await;
    let backend = HttpQaBackend::new(&url).expect("backend");

    let response = backend.ask("What is the refund policy?").await.expect("answer");

    assert_eq!(response.answer, "You asked: What is the refund policy?");
}

#[tokio::test]
async fn ask_error_without_json_detail_has_no_detail() {
    let url = spawn_failing_backend().await;
    let backend = HttpQaBackend::new(&url).expect("backend");

    assert_eq!(
        backend.ask("anything").await,
        Err(RequestError::Backend {
            status: 500,
            detail: None,
        })
    );
}

#[tokio::test]
async fn ask_success_without_answer_is_malformed() {
    let app = Router::new().route(
        "/ask",
        post(|| async { Json(json!({ "message": "wrong shape" })) }),
    );
    let url = spawn_server(app).await.expect("spawn server");
    let backend = HttpQaBackend::new(&url).expect("backend");

    match backend.ask("anything").await {
        Err(RequestError::Transport(reason)) => assert!(reason.starts_with("malformed response")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn orchestrator_runs_a_full_session_over_http() {
    let (url, captured) = spawn_healthy_backend().await;
    let backend: Arc<dyn QaBackend> = Arc::new(HttpQaBackend::new(&url).expect("backend"));
    let session = crate::SessionOrchestrator::new(backend);

    assert_eq!(
        session.start().await,
        shared::domain::ServerStatus::Online
    );
    session
        .upload(Document::new("doc.pdf", b"%PDF-1.4".to_vec()))
        .await
        .expect("upload");
    let reply = session.ask("Who signed it?").await.expect("accepted");

    assert_eq!(reply.text(), "You asked: Who signed it?");
    assert_eq!(captured.lock().await.len(), 1);
    assert_eq!(session.transcript().await.len(), 2);
}

#[tokio::test]
async fn orchestrator_goes_offline_when_health_fails() {
    let url = spawn_failing_backend().await;
    let backend: Arc<dyn QaBackend> = Arc::new(HttpQaBackend::new(&url).expect("backend"));
    let session = crate::SessionOrchestrator::new(backend);

    assert_eq!(
        session.start().await,
        shared::domain::ServerStatus::Offline
    );
}
