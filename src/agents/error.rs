//! Error types for the article agents and the pipeline that chains them.
//!
//! Every stage returns [`AgentResult`]. The HTTP layer maps each variant to
//! one status code via [`AgentError::status_code`], so the taxonomy here is
//! also the service's error contract.

use thiserror::Error;

use crate::error::LlmError;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The football-data API could not supply the base record.
    #[error("Upstream data unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The base record arrived but its shape is unusable.
    #[error("Malformed upstream data: {0}")]
    MalformedUpstreamData(String),

    /// The API answered successfully with zero matching records.
    #[error("Game not found: {0}")]
    GameNotFound(String),

    /// Text generation failed, timed out or returned nothing usable.
    #[error("Article generation failed: {0}")]
    GenerationFailed(String),

    /// A generated article broke the length or section contract.
    #[error("Article validation failed: {0}")]
    ValidationFailed(String),

    /// The caller asked for something the pipeline cannot do.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error from the LLM provider.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Configuration error.
    #[error("Agent configuration error: {0}")]
    Configuration(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// HTTP status code the service answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AgentError::InvalidRequest(_) => 400,
            AgentError::GameNotFound(_) => 404,
            AgentError::UpstreamUnavailable(_)
            | AgentError::MalformedUpstreamData(_)
            | AgentError::GenerationFailed(_)
            | AgentError::Llm(_) => 502,
            AgentError::ValidationFailed(_)
            | AgentError::Configuration(_)
            | AgentError::Json(_) => 500,
        }
    }

    /// Short machine-readable name used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::UpstreamUnavailable(_) => "upstream_unavailable",
            AgentError::MalformedUpstreamData(_) => "malformed_upstream_data",
            AgentError::GameNotFound(_) => "game_not_found",
            AgentError::GenerationFailed(_) => "generation_failed",
            AgentError::ValidationFailed(_) => "validation_failed",
            AgentError::InvalidRequest(_) => "invalid_request",
            AgentError::Llm(_) => "llm_error",
            AgentError::Configuration(_) => "configuration_error",
            AgentError::Json(_) => "json_error",
        }
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AgentError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(AgentError::GameNotFound("1".into()).status_code(), 404);
        assert_eq!(AgentError::UpstreamUnavailable("x".into()).status_code(), 502);
        assert_eq!(AgentError::GenerationFailed("x".into()).status_code(), 502);
        assert_eq!(AgentError::ValidationFailed("x".into()).status_code(), 500);
    }

    #[test]
    fn test_llm_error_converts() {
        let err: AgentError = LlmError::EmptyCompletion.into();
        assert_eq!(err.kind(), "llm_error");
        assert!(err.to_string().contains("empty completion"));
    }
}
