//! HTTP API over the pipeline.
//!
//! Thin transport binding: each endpoint wraps one core or collaborator
//! operation and translates failures into structured error responses. No
//! state lives here beyond the shared [`Pipeline`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::compose;
use crate::error::MelodyError;
use crate::extract;
use crate::pipeline::Pipeline;
use crate::types::TaskState;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractTextRequest {
    pub image_base64: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub study_text: String,
}

#[derive(Debug, Deserialize)]
pub struct MnemonicPlanRequest {
    pub study_text: String,
}

#[derive(Debug, Serialize)]
pub struct MnemonicPlanResponse {
    pub mnemonic_plan: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateSongRequest {
    pub study_text: String,
    pub mnemonic_plan: String,
    #[serde(default = "default_wait")]
    pub wait_for_audio: bool,
}

fn default_wait() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct GenerateSongResponse {
    pub task_id: Option<String>,
    pub audio_urls: Vec<String>,
    pub status: String,
}

/// Error wrapper mapping [`MelodyError`] kinds onto HTTP statuses. The
/// body is always `{"detail": <message>}`.
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<MelodyError> for ApiError {
    fn from(err: MelodyError) -> Self {
        let status = match &err {
            MelodyError::Extraction { .. } => StatusCode::BAD_REQUEST,
            MelodyError::Submission { .. } | MelodyError::GenerationFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            MelodyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, detail = %self.detail, "request failed");
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// POST /extract-text — study text from a base64 image.
async fn extract_text(
    State(state): State<AppState>,
    Json(request): Json<ExtractTextRequest>,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    let study_text =
        extract::study_text_from_base64(state.pipeline.completion(), &request.image_base64).await?;
    Ok(Json(ExtractTextResponse { study_text }))
}

/// POST /mnemonic-plan — melody guide from study text.
async fn mnemonic_plan(
    State(state): State<AppState>,
    Json(request): Json<MnemonicPlanRequest>,
) -> Result<Json<MnemonicPlanResponse>, ApiError> {
    let plan =
        compose::build_mnemonic_plan(state.pipeline.completion(), &request.study_text).await?;
    Ok(Json(MnemonicPlanResponse { mnemonic_plan: plan }))
}

/// POST /generate-song — drive the provider task client.
///
/// With `wait_for_audio` unset the task is submitted and returned pending;
/// otherwise the handler waits for a terminal state and resolves audio
/// URLs. A successful task with zero audio URLs is a valid empty result.
async fn generate_song(
    State(state): State<AppState>,
    Json(request): Json<GenerateSongRequest>,
) -> Result<Json<GenerateSongResponse>, ApiError> {
    let client = state.pipeline.song_client()?.ok_or_else(|| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no song provider API key is configured",
        )
    })?;

    let lyrics = crate::lyrics::lyrics_from_plan(&request.mnemonic_plan, &request.study_text);
    let payload = compose::build_payload(&lyrics, state.pipeline.settings());

    if !request.wait_for_audio {
        let task_id = client.submit(&payload).await?;
        return Ok(Json(GenerateSongResponse {
            task_id: Some(task_id),
            audio_urls: Vec::new(),
            status: TaskState::Pending.to_string(),
        }));
    }

    let task = client.submit_and_wait(&payload).await?;
    Ok(Json(GenerateSongResponse {
        audio_urls: task.audio_urls(),
        status: task.status.to_string(),
        task_id: Some(task.task_id),
    }))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET / — API index.
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "melody-learning API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /extract-text": "extract study text from an image",
            "POST /mnemonic-plan": "build a melody guide",
            "POST /generate-song": "generate a song from study text",
            "GET /health": "health check",
        },
    }))
}

/// Builds the router with permissive CORS (the web frontend is served from
/// a different origin) and request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/extract-text", post(extract_text))
        .route("/mnemonic-plan", post(mnemonic_plan))
        .route("/generate-song", post(generate_song))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
