//! Writing Agent for article generation.
//!
//! Builds one four-section prompt per article, asks the model for the text
//! and validates what comes back. A deterministic fallback article exists
//! for deployments that prefer a plain article over an error; whether it is
//! used is the pipeline's decision, not the writer's.
//!
//! # Example
//!
//! ```ignore
//! use sport_scribe::agents::{WriterConfig, WritingAgent};
//!
//! let writer = WritingAgent::new(llm, WriterConfig::default());
//! let article = writer.generate_game_recap(&writer_input).await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::llm::{AgentOutput, GenerationRequest, LlmProvider, Message};
use crate::metrics::MetricsCollector;
use crate::prompts::{build_article_prompt, ArticlePromptInput, ARTICLE_SECTIONS};
use crate::utils::word_count;

use super::error::{AgentError, AgentResult};
use super::format::WriterInput;
use super::types::ArticleType;

/// Inclusive bounds on article length in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
}

impl WordRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, words: usize) -> bool {
        (self.min..=self.max).contains(&words)
    }
}

impl std::fmt::Display for WordRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Configuration for the writing agent.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Model override; empty uses the provider's default model.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Accepted article length. `None` disables the length check.
    pub word_range: Option<WordRange>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 2000,
            word_range: None,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_word_range(mut self, range: WordRange) -> Self {
        self.word_range = Some(range);
        self
    }
}

/// Normalizes a line for section-marker detection: strips markdown
/// decoration and lowercases.
fn marker_candidate(line: &str) -> String {
    line.trim()
        .trim_start_matches(['#', '*', '_', ' '])
        .to_lowercase()
}

/// Section markers found at the start of a line, in template order.
pub fn section_markers(text: &str) -> Vec<&'static str> {
    let lines: Vec<String> = text.lines().map(marker_candidate).collect();
    ARTICLE_SECTIONS
        .iter()
        .copied()
        .filter(|section| {
            let needle = section.to_lowercase();
            lines.iter().any(|line| line.starts_with(&needle))
        })
        .collect()
}

/// Checks an article against the length and structure contract.
///
/// # Errors
///
/// `ValidationFailed` when the word count is outside `word_range` or no
/// section marker is present.
pub fn validate_article(text: &str, word_range: Option<WordRange>) -> AgentResult<()> {
    let words = word_count(text);
    if let Some(range) = word_range {
        if !range.contains(words) {
            return Err(AgentError::ValidationFailed(format!(
                "Article has {} words, expected {}",
                words, range
            )));
        }
    }

    if section_markers(text).is_empty() {
        return Err(AgentError::ValidationFailed(format!(
            "Article has none of the section markers {}",
            ARTICLE_SECTIONS.join(", ")
        )));
    }

    Ok(())
}

const HEADLINE: &str = "headline";

/// Headline of an article: the text after a `Headline:` marker, or the
/// first markdown heading.
pub fn extract_headline(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim_start_matches(['#', '*', '_', ' ']);
        let is_marker = stripped
            .get(..HEADLINE.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(HEADLINE));
        if !is_marker {
            continue;
        }

        let rest = stripped[HEADLINE.len()..]
            .trim_start_matches([':', '*', ' '])
            .trim_end_matches(['*', ' ']);
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        return lines[i + 1..]
            .iter()
            .find(|l| !l.is_empty())
            .map(|l| l.trim_matches(['#', '*', ' ']).to_string());
    }

    lines
        .iter()
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Deterministic article built from the data alone, without a model call.
///
/// Always carries all four section markers.
pub fn fallback_article(
    article_type: ArticleType,
    subject: &str,
    data_summary: &str,
    storylines: &[String],
) -> String {
    let headline = match storylines.first() {
        Some(storyline) => storyline.clone(),
        None => format!("{}: {}", article_type.display_name(), subject),
    };

    let facts = if data_summary.trim().is_empty() {
        "No detailed data available.".to_string()
    } else {
        data_summary
            .lines()
            .map(|line| format!("- {}", line.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let storyline_text = if storylines.is_empty() {
        "- No storylines available".to_string()
    } else {
        storylines
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Headline: {headline}\n\n\
         Introduction:\n{label} for {subject}.\n\n\
         Body:\n{facts}\n\nKey storylines:\n{storyline_text}\n\n\
         Conclusion:\nThis article was assembled automatically from match data.",
        headline = headline,
        label = article_type.display_name(),
        subject = subject,
        facts = facts,
        storyline_text = storyline_text,
    )
}

/// Writing agent that turns a [`WriterInput`] into article text.
pub struct WritingAgent {
    llm: Arc<dyn LlmProvider>,
    config: WriterConfig,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for WritingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritingAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WritingAgent {
    /// Agent name constant.
    pub const AGENT_NAME: &'static str = "writer";

    pub fn new(llm: Arc<dyn LlmProvider>, config: WriterConfig) -> Self {
        Self {
            llm,
            config,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Model name reported in article metadata.
    pub fn model_name(&self) -> &str {
        if self.config.model.is_empty() {
            self.llm.default_model()
        } else {
            &self.config.model
        }
    }

    pub async fn generate_game_recap(&self, input: &WriterInput) -> AgentResult<String> {
        self.generate(ArticleType::GameRecap, input).await
    }

    pub async fn generate_preview_article(&self, input: &WriterInput) -> AgentResult<String> {
        self.generate(ArticleType::Preview, input).await
    }

    pub async fn generate_player_spotlight(&self, input: &WriterInput) -> AgentResult<String> {
        self.generate(ArticleType::PlayerSpotlight, input).await
    }

    /// Generates and validates one article.
    ///
    /// # Errors
    ///
    /// `GenerationFailed` when the model call fails or returns nothing,
    /// `ValidationFailed` when the text breaks the article contract.
    pub async fn generate(&self, article_type: ArticleType, input: &WriterInput) -> AgentResult<String> {
        tracing::info!(
            article_type = %article_type,
            subject = %input.subject,
            storylines = input.storylines.len(),
            "Generating article"
        );

        let prompt = build_article_prompt(ArticlePromptInput {
            article_type,
            data_summary: &input.data_summary,
            research_context: &input.research_context,
            storylines: &input.storylines,
            target_length: input.target_length,
            tone: input.tone.as_deref(),
        });

        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![Message::system(prompt.system), Message::user(prompt.user)],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let started = Instant::now();
        let result = self.llm.generate(request).await;
        self.metrics.record_llm_request(
            self.model_name(),
            result.is_ok(),
            started.elapsed().as_secs_f64(),
        );

        let response = result.map_err(|e| AgentError::GenerationFailed(e.to_string()))?;
        let content = response
            .first_content()
            .ok_or_else(|| AgentError::GenerationFailed("Empty article response".to_string()))?;

        let article = AgentOutput::decode(content).into_text().trim().to_string();
        if article.is_empty() {
            return Err(AgentError::GenerationFailed(
                "Model returned an empty article".to_string(),
            ));
        }

        validate_article(&article, self.config.word_range)?;

        tracing::debug!(words = word_count(&article), "Article generated");
        Ok(article)
    }
}
