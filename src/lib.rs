//! sport-scribe: football article generation from live match data.
//!
//! A pipeline of agents collects fixtures from API-Football, researches
//! storylines and writes game recaps, previews and player spotlights with
//! an OpenAI-compatible language model. The pipeline is exposed through a
//! CLI and a small HTTP service.

// Core modules
pub mod agents;
pub mod cli;
pub mod error;
pub mod football;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use agents::{AgentError, AgentResult, ArticleRequest, ArticleResult, ArticleType};
pub use error::LlmError;
pub use pipeline::{ArticlePipeline, ScribeConfig};
