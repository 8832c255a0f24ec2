//! HTTP handlers.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::agents::{AgentError, ArticleMetadata, ArticleRequest, ArticleType};
use crate::pipeline::PIPELINE_VERSION;
use crate::prompts::DEFAULT_TARGET_WORDS;
use crate::utils::sanitize_log_input;

use super::state::AppState;

fn default_article_type() -> String {
    ArticleType::GameRecap.as_str().to_string()
}

fn default_target_length() -> Option<u32> {
    Some(DEFAULT_TARGET_WORDS)
}

fn default_priority() -> String {
    "normal".to_string()
}

/// Body of `POST /generate-article`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateArticleRequest {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default = "default_article_type")]
    pub article_type: String,
    #[serde(default = "default_target_length")]
    pub target_length: Option<u32>,
    /// Accepted for compatibility; requests are served in arrival order.
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub player_id: Option<String>,
}

impl GenerateArticleRequest {
    fn into_article_request(self) -> Result<ArticleRequest, AgentError> {
        let article_type = ArticleType::from_str(&self.article_type)?;
        Ok(ArticleRequest {
            article_type,
            game_id: self.game_id,
            player_id: self.player_id,
            target_length: self.target_length,
            tone: self.tone,
        })
    }
}

/// Body of a successful `POST /generate-article`.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleResponse {
    pub article_id: Uuid,
    pub status: String,
    pub content: String,
    pub metadata: ArticleMetadata,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub agents_status: BTreeMap<String, String>,
}

/// Error response: the status plus a `{"detail", "error"}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    detail: String,
}

impl ApiError {
    fn not_ready() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            kind: "not_ready",
            detail: "Service not ready".to_string(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        Self {
            status: StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            kind: e.kind(),
            detail: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "detail": self.detail, "error": self.kind })),
        )
            .into_response()
    }
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Sport Scribe article service",
        "version": PIPELINE_VERSION,
        "status": "running",
    }))
}

/// GET /health -- 503 while the pipeline is unavailable
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match &state.pipeline {
        Some(pipeline) => {
            let status = pipeline.status();
            (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "healthy".to_string(),
                    version: status.version,
                    environment: state.environment.to_string(),
                    agents_status: status.agents,
                }),
            )
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                version: PIPELINE_VERSION.to_string(),
                environment: state.environment.to_string(),
                agents_status: BTreeMap::new(),
            }),
        ),
    }
}

/// POST /generate-article
pub async fn generate_article(
    State(state): State<AppState>,
    Json(body): Json<GenerateArticleRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let pipeline = state.pipeline.as_ref().ok_or_else(ApiError::not_ready)?;

    tracing::info!(
        article_type = %sanitize_log_input(&body.article_type),
        game_id = %sanitize_log_input(body.game_id.as_deref().unwrap_or("-")),
        priority = %sanitize_log_input(&body.priority),
        "Article requested"
    );

    let request = body.into_article_request()?;
    let article = pipeline.generate(request).await?;

    Ok(Json(ArticleResponse {
        article_id: article.article_id(),
        status: "completed".to_string(),
        content: article.content,
        metadata: article.metadata,
    }))
}
