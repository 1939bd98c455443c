//! Local JSON HTTP server.
//!
//! Stands in for the desktop app's IPC bridge: the UI indexes the vault once,
//! then asks for context per meeting, passing the user's current weights
//! with every request.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/index` | Re-index the vault (optional `vault_path` override) |
//! | `POST` | `/context` | Ranked notes for a meeting |
//! | `GET`  | `/stats` | Stats for the active snapshot |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be >= 1" } }
//! ```
//!
//! Error codes: `bad_request` (400), `vault_unreadable` (404),
//! `index_not_ready` (409), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a renderer process
//! served from `file://` or a dev server can call in.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::engine::ContextIndexer;
use crate::error::ContextError;
use crate::models::{ContextMatch, IndexStats, Query};
use crate::progress::IndexProgressEvent;
use crate::weights::RelevanceWeights;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    indexer: Arc<ContextIndexer>,
}

/// Starts the HTTP server.
///
/// Indexes the configured vault before accepting requests. A failed initial
/// build is logged and the server still starts; `/context` answers
/// `index_not_ready` until a `POST /index` succeeds.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());
    let indexer = Arc::new(ContextIndexer::new(
        config.vault.scan.clone(),
        config.retrieval.params(),
    ));

    let state = AppState { config, indexer };
    match reindex(&state, None).await {
        Ok(stats) => println!("Indexed {} notes", stats.total_documents),
        Err(err) => tracing::warn!(code = %err.code, message = %err.message, "initial index failed"),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/index", post(handle_index))
        .route("/context", post(handle_context))
        .route("/stats", get(handle_stats))
        .layer(cors)
        .with_state(state);

    println!("Prep context server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn internal(message: impl Into<String>) -> AppError {
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<ContextError> for AppError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Io { .. } => {
                app_error(StatusCode::NOT_FOUND, "vault_unreadable", err.to_string())
            }
            ContextError::IndexNotReady => {
                app_error(StatusCode::CONFLICT, "index_not_ready", err.to_string())
            }
            ContextError::InvalidWeights { .. } | ContextError::InvalidPattern { .. } => {
                bad_request(err.to_string())
            }
            ContextError::Parse { .. } => internal(err.to_string()),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /index ============

#[derive(Debug, Default, Deserialize)]
struct IndexRequest {
    #[serde(default)]
    vault_path: Option<PathBuf>,
}

async fn handle_index(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IndexStats>, AppError> {
    // An empty body re-indexes the configured vault.
    let request: IndexRequest = if body.iter().all(u8::is_ascii_whitespace) {
        IndexRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| bad_request(format!("invalid body: {}", e)))?
    };
    reindex(&state, request.vault_path).await.map(Json)
}

/// Index on the blocking pool; the walk and parse are synchronous.
async fn reindex(state: &AppState, vault_path: Option<PathBuf>) -> Result<IndexStats, AppError> {
    let root = vault_path.unwrap_or_else(|| state.config.vault.root.clone());
    let indexer = state.indexer.clone();

    tokio::task::spawn_blocking(move || {
        let progress = |event: IndexProgressEvent| {
            tracing::debug!(stage = event.stage(), ?event, "index progress");
        };
        indexer.index_vault(&root, &progress)
    })
    .await
    .map_err(|e| internal(format!("index task failed: {}", e)))?
    .map_err(AppError::from)
}

// ============ POST /context ============

#[derive(Debug, Deserialize)]
struct ContextRequest {
    #[serde(flatten)]
    query: Query,
    /// Defaults to `[retrieval.weights]`; missing keys default individually.
    #[serde(default)]
    weights: Option<RelevanceWeights>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    explain: bool,
}

#[derive(Serialize)]
struct ContextResponse {
    matches: Vec<ContextMatch>,
}

async fn handle_context(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ContextResponse>, AppError> {
    // Parsed by hand so malformed bodies get the JSON error contract.
    let request: ContextRequest =
        serde_json::from_slice(&body).map_err(|e| bad_request(format!("invalid body: {}", e)))?;
    let mut params = *state.indexer.params();
    if let Some(limit) = request.limit {
        if limit == 0 {
            return Err(bad_request("limit must be >= 1"));
        }
        params.final_limit = limit;
    }
    params.explain = request.explain;
    let weights = request.weights.unwrap_or(state.config.retrieval.weights);

    let matches = state
        .indexer
        .find_relevant_context_with(&request.query, &weights, &params)?;
    Ok(Json(ContextResponse { matches }))
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.indexer.get_stats())
}
