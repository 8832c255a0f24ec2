//! Article pipeline orchestration.
//!
//! The pipeline turns one [`ArticleRequest`](crate::agents::ArticleRequest)
//! into a finished article by running the agents in order:
//!
//! 1. **Collect**: fetch the game (or player) from API-Football
//! 2. **Extract**: read typed match facts from the raw records
//! 3. **Enrich**: team form, head-to-head, league table and key players, concurrently
//! 4. **Research**: storylines and historical context
//! 5. **Format**: shape facts and research into writer input
//! 6. **Write**: generate the article with the language model
//! 7. **Edit**: fact and style review
//!
//! Enrichment failures and storyline fallbacks do not fail the run; they are
//! listed as degradations in the article metadata.
//!
//! # Example
//!
//! ```rust,ignore
//! use sport_scribe::pipeline::{ArticlePipeline, ScribeConfig};
//!
//! let config = ScribeConfig::from_env()?;
//! let pipeline = ArticlePipeline::from_config(config)?;
//!
//! let article = pipeline.generate_game_recap("239625").await?;
//! println!("{}", article.content);
//! ```

pub mod config;
pub mod orchestrator;

pub use config::{ConfigError, Environment, ScribeConfig, MAX_STORYLINE_CAP};
pub use orchestrator::{
    ArticlePipeline, PipelineBuilder, PipelineStatus, FALLBACK_MODEL, PIPELINE_VERSION,
};
