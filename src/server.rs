//! REST server over the [`DocumentRag`] facade.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/` | API info and endpoint list |
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/ui` | Single-page web UI |
//! | `POST`   | `/upload` | Multipart upload, field `file` |
//! | `POST`   | `/query` | `{"question", "source_filter"?, "history"?}` |
//! | `GET`    | `/documents` | Uploaded documents, newest first |
//! | `DELETE` | `/documents/{id}` | Remove a document and its chunks |
//! | `GET`    | `/stats` | Collection statistics |
//! | `GET`    | `/history` | Query records, newest first (`?limit=`) |
//! | `DELETE` | `/reset` | Remove every document and query record |
//! | `POST`   | `/dashboard` | Write dashboard reports (`?metrics_only=true`) |
//!
//! # Error Contract
//!
//! Every response body carries a `status` field. Errors look like:
//!
//! ```json
//! { "status": "error", "kind": "not_found", "message": "not found: document 42" }
//! ```
//!
//! | Kind | HTTP |
//! |------|------|
//! | `invalid_input` | 400 |
//! | `not_found`, `empty_retrieval` | 404 |
//! | `payload_too_large` | 413 |
//! | `ingestion` | 422 |
//! | `provider` | 502 |
//! | `config`, `storage` | 500 |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the UI can be served
//! from elsewhere during development.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        rejection::JsonRejection,
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use docintel_core::error::ErrorKind;
use docintel_core::models::Turn;

use crate::config::Config;
use crate::dashboard;
use crate::rag_system::{DocumentRag, OpError, OpResult};

/// Multipart framing around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    rag: Arc<DocumentRag>,
    dashboard_dir: PathBuf,
}

impl AppState {
    pub fn new(rag: Arc<DocumentRag>, dashboard_dir: PathBuf) -> Self {
        Self { rag, dashboard_dir }
    }
}

/// Starts the HTTP server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let rag = Arc::new(DocumentRag::from_config(config).await?);
    let state = AppState::new(rag, config.dashboard.output_dir.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "server listening");
    println!("docintel listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = (state.rag.max_upload_bytes() as usize).saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/ui", get(handle_ui))
        .route("/upload", post(handle_upload))
        .route("/query", post(handle_query))
        .route("/documents", get(handle_documents))
        .route("/documents/{id}", delete(handle_delete))
        .route("/stats", get(handle_stats))
        .route("/history", get(handle_history))
        .route("/reset", delete(handle_reset))
        .route("/dashboard", post(handle_dashboard))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Responses ============

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound | ErrorKind::EmptyRetrieval => StatusCode::NOT_FOUND,
        ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::Ingestion => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Provider => StatusCode::BAD_GATEWAY,
        ErrorKind::Config | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T: Serialize> IntoResponse for OpResult<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            OpResult::Success(_) => StatusCode::OK,
            OpResult::Error(e) => status_for(e.kind),
        };
        (status, Json(self)).into_response()
    }
}

fn error_response(kind: ErrorKind, message: impl Into<String>) -> Response {
    OpResult::<()>::Error(OpError {
        kind,
        message: message.into(),
    })
    .into_response()
}

fn multipart_error(e: MultipartError) -> Response {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        error_response(ErrorKind::PayloadTooLarge, e.body_text())
    } else {
        error_response(ErrorKind::InvalidInput, e.body_text())
    }
}

// ============ GET / and /health ============

#[derive(Serialize)]
struct ApiInfo {
    name: &'static str,
    version: &'static str,
    embedding_model: String,
    llm_model: String,
    endpoints: Vec<&'static str>,
}

async fn handle_root(State(state): State<AppState>) -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "docintel",
        version: env!("CARGO_PKG_VERSION"),
        embedding_model: state.rag.embedder_model().to_string(),
        llm_model: state.rag.generator_model().to_string(),
        endpoints: vec![
            "GET /health",
            "GET /ui",
            "POST /upload",
            "POST /query",
            "GET /documents",
            "DELETE /documents/{id}",
            "GET /stats",
            "GET /history",
            "DELETE /reset",
            "POST /dashboard",
        ],
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_ui() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}

// ============ POST /upload ============

/// Reads the `file` field of a multipart body and hands it to the facade.
/// Other fields are ignored.
async fn handle_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error(e),
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => return error_response(ErrorKind::InvalidInput, "file field has no filename"),
        };
        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) => return multipart_error(e),
        };
        return state
            .rag
            .upload_bytes(&filename, bytes.to_vec())
            .await
            .into_response();
    }
    error_response(ErrorKind::InvalidInput, "multipart field 'file' is required")
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
    #[serde(default)]
    source_filter: Option<String>,
    #[serde(default)]
    history: Vec<Turn>,
}

async fn handle_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return error_response(ErrorKind::InvalidInput, e.body_text()),
    };
    let source = req
        .source_filter
        .as_deref()
        .filter(|s| !s.trim().is_empty());
    state
        .rag
        .query_with_history(&req.question, source, &req.history)
        .await
        .into_response()
}

// ============ Documents ============

async fn handle_documents(State(state): State<AppState>) -> Response {
    state.rag.get_uploaded_documents().await.into_response()
}

async fn handle_delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.rag.delete_document(&id).await.into_response()
}

async fn handle_stats(State(state): State<AppState>) -> Response {
    state.rag.collection_stats().await.into_response()
}

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Response {
    state.rag.query_history(params.limit).await.into_response()
}

async fn handle_reset(State(state): State<AppState>) -> Response {
    state.rag.reset_collection().await.into_response()
}

// ============ POST /dashboard ============

#[derive(Deserialize)]
struct DashboardParams {
    #[serde(default)]
    metrics_only: bool,
}

async fn handle_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let res = dashboard::write_reports(&state.rag, &state.dashboard_dir, params.metrics_only).await;
    OpResult::from_result("dashboard", res).into_response()
}
