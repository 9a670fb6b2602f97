//! HTTP API for the question-answering service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a question |
//! | `POST` | `/search` | Ranked chunks for a query |
//! | `GET`  | `/history` | Most recent question/answer pairs |
//! | `GET`  | `/model-info` | Load status and index sizes |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Every error response is a flat JSON object:
//!
//! ```json
//! { "error": "Question is required" }
//! ```
//!
//! `400` for validation errors, including bodies that are not valid JSON
//! and malformed query strings; `500` when the model is not loaded or a
//! query fails. Internal details are logged, never returned. An empty
//! request body is treated as `{}`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::bot::AgriBot;
use crate::config::Config;
use crate::db;
use crate::errors::BotError;
use crate::history::HistoryStore;
use crate::migrate;
use crate::models::{ModelInfo, QueryRecord, SearchHit};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<AgriBot>,
    /// `None` when history is disabled or its database failed to open.
    pub history: Option<HistoryStore>,
    pub history_limit: i64,
}

/// Starts the HTTP server with a bot loaded from `config`.
///
/// Runs until the process is terminated. Model load failures do not stop
/// the server; it starts in degraded mode instead.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bot = Arc::new(AgriBot::load(config).await);
    run_server_with_bot(config, bot).await
}

/// Starts the HTTP server around an already-constructed bot.
pub async fn run_server_with_bot(config: &Config, bot: Arc<AgriBot>) -> anyhow::Result<()> {
    let history = open_history(config).await;

    let state = AppState {
        bot,
        history,
        history_limit: config.history.default_limit,
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("agribot listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn open_history(config: &Config) -> Option<HistoryStore> {
    if !config.history.enabled {
        return None;
    }

    let opened = async {
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;
        anyhow::Ok(HistoryStore::new(pool))
    }
    .await;

    match opened {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::error!(
                path = %config.history.db_path.display(),
                error = %e,
                "history database unavailable; answers will not be recorded"
            );
            None
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handle_ask))
        .route("/search", post(handle_search))
        .route("/history", get(handle_history))
        .route("/model-info", get(handle_model_info))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<BotError> for AppError {
    fn from(err: BotError) -> Self {
        let status = match &err {
            BotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BotError::ModelUnavailable(_) | BotError::Query(_) => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            message: err.public_message(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

/// Decodes a JSON request body; an empty body decodes as `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        bad_request("Invalid JSON body")
    })
}

// ============ POST /ask ============

#[derive(Deserialize, Default)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    question: String,
    answer: String,
    model_loaded: bool,
}

async fn handle_ask(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AskResponse>, AppError> {
    let req: AskRequest = parse_body(&body)?;
    let question = req.question.unwrap_or_default().trim().to_string();
    let answer = state.bot.answer(&question).await?;

    if let Some(history) = &state.history {
        if let Err(e) = history.record(&question, &answer.text).await {
            tracing::warn!(error = %e, "failed to record query history");
        }
    }

    Ok(Json(AskResponse {
        question,
        answer: answer.text,
        model_loaded: state.bot.is_loaded(),
    }))
}

// ============ POST /search ============

#[derive(Deserialize, Default)]
struct SearchRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
    total_results: usize,
}

async fn handle_search(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SearchResponse>, AppError> {
    let req: SearchRequest = parse_body(&body)?;
    let query = req.query.unwrap_or_default().trim().to_string();
    let results = state.bot.search(&query, req.top_k).await?;

    Ok(Json(SearchResponse {
        query,
        total_results: results.len(),
        results,
    }))
}

// ============ GET /history ============

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct HistoryResponse {
    history: Vec<QueryRecord>,
    total_count: usize,
}

async fn handle_history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(params) = params.map_err(|_| bad_request("limit must be an integer"))?;
    let limit = params.limit.unwrap_or(state.history_limit);
    if limit < 1 {
        return Err(bad_request("limit must be >= 1"));
    }

    let history = match &state.history {
        Some(store) => store.recent(limit).await.map_err(|e| {
            tracing::error!(error = %e, "failed to read query history");
            internal("Failed to read history")
        })?,
        None => Vec::new(),
    };

    Ok(Json(HistoryResponse {
        total_count: history.len(),
        history,
    }))
}

// ============ GET /model-info ============

async fn handle_model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.bot.info())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    model_loaded: bool,
    version: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.bot.is_loaded(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
