//! Error types shared across sport-scribe subsystems.
//!
//! Agent-level failures live in [`crate::agents::AgentError`]; this module
//! holds the text-generation client errors, which are raised below the agent
//! layer and converted on the way up.

use thiserror::Error;

/// Errors that can occur while talking to the text-generation service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::ApiError {
            code: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (503): overloaded");
        assert!(LlmError::MissingApiKey.to_string().contains("OPENAI_API_KEY"));
    }
}
