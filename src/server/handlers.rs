//! HTTP handlers for the question-answering API

use crate::agent::QaPipeline;
use crate::server::error::{ApiError, ApiResult};
use crate::types::QAResponse;
use axum::{extract::State, routing, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Body of POST /qa
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRequest {
    pub question: String,
}

/// Body of GET /health
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QaPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<QaPipeline>) -> Self {
        Self { pipeline }
    }
}

/// POST /qa - run the full pipeline for one question
pub async fn answer_question(
    State(state): State<AppState>,
    Json(request): Json<QaRequest>,
) -> ApiResult<Json<QAResponse>> {
    if request.question.trim().is_empty() {
        return Err(ApiError::bad_request("question must not be empty"));
    }

    info!("POST /qa: {}", request.question);
    let response = state.pipeline.answer(&request.question).await?;
    Ok(Json(response))
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/qa", routing::post(answer_question))
        .route("/health", routing::get(health_check))
}
