//! LLM prompts for the article pipeline.
//!
//! - [`storyline`] - delegated storyline generation
//! - [`article`] - the four-section article template used by the writer
//!
//! # Usage
//!
//! ```no_run
//! use sport_scribe::agents::ArticleType;
//! use sport_scribe::prompts::{build_article_prompt, build_storyline_prompt, ArticlePromptInput};
//!
//! let storyline_prompt = build_storyline_prompt(r#"{"fixture": {"id": 239625}}"#);
//! let storylines = vec!["Late penalty settles it".to_string()];
//! let article = build_article_prompt(ArticlePromptInput {
//!     article_type: ArticleType::GameRecap,
//!     data_summary: "Match: Rapide Oued ZEM vs Wydad AC",
//!     research_context: &[],
//!     storylines: &storylines,
//!     target_length: Some(600),
//!     tone: None,
//! });
//! ```

pub mod article;
pub mod storyline;

pub use article::{
    build_article_prompt, writer_system_prompt, ArticlePrompt, ArticlePromptInput,
    ARTICLE_SECTIONS, DEFAULT_TARGET_WORDS,
};
pub use storyline::{build_storyline_prompt, STORYLINE_SYSTEM_PROMPT};
