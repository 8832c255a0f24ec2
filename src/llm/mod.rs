//! Text-generation integration for sport-scribe.
//!
//! Agents depend on the [`LlmProvider`] trait only. The production
//! implementation is [`OpenAiCompatibleClient`]; tests substitute mocks.
//!
//! ```ignore
//! use sport_scribe::llm::{GenerationRequest, LlmProvider, Message, OpenAiCompatibleClient};
//!
//! let client = OpenAiCompatibleClient::from_env()?;
//! let request = GenerationRequest::new("", vec![Message::user("Summarise the derby")]);
//! let response = client.generate(request).await?;
//! println!("{}", response.first_content().unwrap_or_default());
//! ```

pub mod client;
pub mod output;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, OpenAiCompatibleClient,
    Usage, DEFAULT_API_BASE, DEFAULT_MODEL,
};
pub use output::AgentOutput;
