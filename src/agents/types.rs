//! Core types for the article pipeline.
//!
//! Defines article requests and results, pipeline stages, and the events the
//! orchestrator emits while it runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::editor::EditorFeedback;
use super::error::AgentError;

/// Kind of article the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleType {
    /// Post-match report of a finished game.
    GameRecap,
    /// Look-ahead at an upcoming game.
    Preview,
    /// Profile of one player, optionally around one game.
    PlayerSpotlight,
}

impl ArticleType {
    /// Returns the wire name of this article type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::GameRecap => "game_recap",
            ArticleType::Preview => "preview",
            ArticleType::PlayerSpotlight => "player_spotlight",
        }
    }

    /// Returns a human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            ArticleType::GameRecap => "Game Recap",
            ArticleType::Preview => "Match Preview",
            ArticleType::PlayerSpotlight => "Player Spotlight",
        }
    }
}

impl std::fmt::Display for ArticleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArticleType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "game_recap" | "recap" => Ok(ArticleType::GameRecap),
            "preview" | "match_preview" => Ok(ArticleType::Preview),
            "player_spotlight" | "spotlight" => Ok(ArticleType::PlayerSpotlight),
            other => Err(AgentError::InvalidRequest(format!(
                "Unsupported article type: {}",
                other
            ))),
        }
    }
}

/// A request for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRequest {
    pub article_type: ArticleType,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub player_id: Option<String>,
    /// Requested length in words, passed to the writer prompt.
    #[serde(default)]
    pub target_length: Option<u32>,
    #[serde(default)]
    pub tone: Option<String>,
}

impl ArticleRequest {
    pub fn game_recap(game_id: impl Into<String>) -> Self {
        Self {
            article_type: ArticleType::GameRecap,
            game_id: Some(game_id.into()),
            player_id: None,
            target_length: None,
            tone: None,
        }
    }

    pub fn preview(game_id: impl Into<String>) -> Self {
        Self {
            article_type: ArticleType::Preview,
            ..Self::game_recap(game_id)
        }
    }

    pub fn player_spotlight(player_id: impl Into<String>, game_id: Option<String>) -> Self {
        Self {
            article_type: ArticleType::PlayerSpotlight,
            game_id,
            player_id: Some(player_id.into()),
            target_length: None,
            tone: None,
        }
    }

    pub fn with_target_length(mut self, words: u32) -> Self {
        self.target_length = Some(words);
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }
}

/// A stage that completed in a reduced mode instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub stage: PipelineStage,
    pub reason: String,
}

impl Degradation {
    pub fn new(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Metadata attached to every generated article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub article_id: Uuid,
    pub article_type: ArticleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub headline: Option<String>,
    pub slug: Option<String>,
    pub storylines: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub pipeline_duration_ms: u64,
    pub data_sources: Vec<String>,
    pub model_used: String,
    pub word_count: usize,
    pub review_feedback: Option<EditorFeedback>,
    pub degradations: Vec<Degradation>,
    pub pipeline_version: String,
}

impl ArticleMetadata {
    /// True when any stage ran in a reduced mode.
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// A finished article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleResult {
    pub content: String,
    pub metadata: ArticleMetadata,
}

impl ArticleResult {
    pub fn article_id(&self) -> Uuid {
        self.metadata.article_id
    }
}

/// Stages of the article pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Fetch the base record from the football API.
    Collect,
    /// Project teams, players and events out of the record.
    Extract,
    /// Fetch supporting team, standings and head-to-head data.
    Enrich,
    /// Derive storylines and historical context.
    Research,
    /// Shape everything into the writer's input.
    Format,
    /// Generate the article text.
    Write,
    /// Review the article.
    Edit,
}

impl PipelineStage {
    /// Returns all stages in order.
    pub fn all_stages() -> Vec<PipelineStage> {
        vec![
            PipelineStage::Collect,
            PipelineStage::Extract,
            PipelineStage::Enrich,
            PipelineStage::Research,
            PipelineStage::Format,
            PipelineStage::Write,
            PipelineStage::Edit,
        ]
    }

    /// Label used for metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Collect => "collect",
            PipelineStage::Extract => "extract",
            PipelineStage::Enrich => "enrich",
            PipelineStage::Research => "research",
            PipelineStage::Format => "format",
            PipelineStage::Write => "write",
            PipelineStage::Edit => "edit",
        }
    }

    /// Returns the display name for this stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStage::Collect => "Data Collection",
            PipelineStage::Extract => "Extraction",
            PipelineStage::Enrich => "Enrichment",
            PipelineStage::Research => "Research",
            PipelineStage::Format => "Formatting",
            PipelineStage::Write => "Writing",
            PipelineStage::Edit => "Editing",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Events emitted by the pipeline for progress tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A pipeline stage has started.
    StageStarted {
        stage: PipelineStage,
        timestamp: DateTime<Utc>,
    },
    /// A pipeline stage has completed.
    StageCompleted {
        stage: PipelineStage,
        /// Short description of what the stage produced.
        summary: String,
        timestamp: DateTime<Utc>,
    },
    /// A pipeline stage has failed and the run is aborted.
    StageFailed {
        stage: PipelineStage,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// A stage fell back to a reduced mode and the run continues.
    StageDegraded {
        stage: PipelineStage,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// The article is ready.
    PipelineCompleted {
        article_id: Uuid,
        duration_ms: u64,
    },
    /// The pipeline has failed.
    PipelineFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    pub fn stage_started(stage: PipelineStage) -> Self {
        PipelineEvent::StageStarted {
            stage,
            timestamp: Utc::now(),
        }
    }

    pub fn stage_completed(stage: PipelineStage, summary: impl Into<String>) -> Self {
        PipelineEvent::StageCompleted {
            stage,
            summary: summary.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn stage_failed(stage: PipelineStage, error: impl Into<String>) -> Self {
        PipelineEvent::StageFailed {
            stage,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn stage_degraded(stage: PipelineStage, reason: impl Into<String>) -> Self {
        PipelineEvent::StageDegraded {
            stage,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn pipeline_completed(article_id: Uuid, duration_ms: u64) -> Self {
        PipelineEvent::PipelineCompleted {
            article_id,
            duration_ms,
        }
    }

    pub fn pipeline_failed(error: impl Into<String>) -> Self {
        PipelineEvent::PipelineFailed {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}
