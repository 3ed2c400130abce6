//! HTTP API.
//!
//! | Method | Path                      | Purpose                          |
//! |--------|---------------------------|----------------------------------|
//! | POST   | `/upload`                 | Ingest a document (multipart)    |
//! | POST   | `/ask`                    | Answer a question                |
//! | GET    | `/status`                 | Corpus summary                   |
//! | GET    | `/health`                 | Liveness check                   |
//! | DELETE | `/documents/{source}`     | Remove one document's chunks     |
//! | POST   | `/clear`                  | Remove everything                |

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use askdoc_core::store::CorpusStore;
use askdoc_core::Error;

use crate::config::{ChunkingConfig, Config};
use crate::ingest::ingest_bytes;
use crate::ocr::OcrEngine;
use crate::rag::{Answer, RagEngine};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RagEngine>,
    pub store: Arc<dyn CorpusStore>,
    pub ocr: Arc<dyn OcrEngine>,
    pub chunking: ChunkingConfig,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(upload))
        .route("/ask", post(ask))
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/documents/{source_name}", delete(remove_document))
        .route("/clear", post(clear))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}

// ============ Error mapping ============

struct AppError(Error);

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_format"),
            Error::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failed"),
            Error::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration"),
            Error::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
            Error::Generation(_) => (StatusCode::BAD_GATEWAY, "generation"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "bad_request",
            message: message.into(),
        },
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

// ============ Handlers ============

#[derive(Serialize)]
struct UploadResponse {
    source_name: String,
    chunks_added: usize,
    skipped_units: usize,
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = match field.file_name() {
                    Some(name) => name.to_string(),
                    None => return bad_request("file field is missing a filename"),
                };
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(e) => return bad_request(format!("failed to read upload: {}", e)),
                }
            }
            Ok(None) => break,
            Err(e) => return bad_request(format!("invalid multipart body: {}", e)),
        }
    }
    let Some((filename, bytes)) = file else {
        return bad_request("multipart body must contain a 'file' field");
    };

    match ingest_bytes(&state.store, state.ocr.as_ref(), &state.chunking, &filename, &bytes).await
    {
        Ok(report) => Json(UploadResponse {
            source_name: report.source_name,
            chunks_added: report.chunks_added,
            skipped_units: report.skipped_units,
        })
        .into_response(),
        Err(e) => AppError(e).into_response(),
    }
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    max_results: Option<usize>,
}

// A blank question gets the canned zero-confidence answer via the engine's
// empty-query guard, never an error status.
async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, AppError> {
    let answer = state
        .engine
        .answer(&request.question, request.max_results)
        .await?;
    Ok(Json(answer))
}

#[derive(Serialize)]
struct StatusResponse {
    total_chunks: usize,
    documents: Vec<String>,
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(StatusResponse {
        total_chunks: state.store.count().await?,
        documents: state.store.source_names().await?,
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct RemoveResponse {
    source_name: String,
    chunks_removed: usize,
}

async fn remove_document(
    State(state): State<AppState>,
    Path(source_name): Path<String>,
) -> Result<Response, AppError> {
    let removed = state.store.remove_source(&source_name).await?;
    if removed == 0 {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "not_found",
                message: format!("no document named {}", source_name),
            },
        };
        return Ok((StatusCode::NOT_FOUND, Json(body)).into_response());
    }
    Ok(Json(RemoveResponse {
        source_name,
        chunks_removed: removed,
    })
    .into_response())
}

async fn clear(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.store.clear().await?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}
