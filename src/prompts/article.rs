//! Article prompt builder for the writer stage.
//!
//! Every article type shares one four-section template. The model is told to
//! lead with facts of the current match and to treat research context as
//! background.

use crate::agents::types::ArticleType;

/// Section markers every article must use, in order.
pub const ARTICLE_SECTIONS: [&str; 4] = ["Headline", "Introduction", "Body", "Conclusion"];

/// Default requested length when the caller gives none.
pub const DEFAULT_TARGET_WORDS: u32 = 800;

/// System and user prompt for one article.
#[derive(Debug, Clone)]
pub struct ArticlePrompt {
    pub system: String,
    pub user: String,
}

impl ArticlePrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Inputs to [`build_article_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct ArticlePromptInput<'a> {
    pub article_type: ArticleType,
    /// Facts of the current match or player, one per line.
    pub data_summary: &'a str,
    /// Background lines (head-to-head, table, form).
    pub research_context: &'a [String],
    pub storylines: &'a [String],
    pub target_length: Option<u32>,
    pub tone: Option<&'a str>,
}

/// System prompt for an article type.
pub fn writer_system_prompt(article_type: ArticleType) -> &'static str {
    match article_type {
        ArticleType::GameRecap => {
            "You are a professional sports journalist specializing in football match reports."
        }
        ArticleType::Preview => {
            "You are a professional sports journalist specializing in football match previews."
        }
        ArticleType::PlayerSpotlight => {
            "You are a professional sports journalist specializing in football player analysis."
        }
    }
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the system and user prompt for one article.
pub fn build_article_prompt(input: ArticlePromptInput<'_>) -> ArticlePrompt {
    let target = input.target_length.unwrap_or(DEFAULT_TARGET_WORDS);
    let tone = input.tone.unwrap_or("professional");
    let data_summary = if input.data_summary.trim().is_empty() {
        "No detailed data available"
    } else {
        input.data_summary.trim()
    };

    let user = format!(
        r#"Write a football {article_label} based on the data below.

## CURRENT MATCH DATA
{data_summary}

## KEY STORYLINES
{storylines}

## RESEARCH CONTEXT
{research}

## REQUIREMENTS
- Prioritize facts from CURRENT MATCH DATA. Use research context only as background.
- Do not invent scores, scorers, minutes, quotes or statistics.
- Weave the key storylines in naturally.
- Tone: {tone}.
- Target length: about {target} words.

## STRUCTURE
Use exactly these four sections, each introduced by its marker on its own line:
{sections}"#,
        article_label = input.article_type.display_name().to_lowercase(),
        data_summary = data_summary,
        storylines = bullet_list(input.storylines, "- (none)"),
        research = bullet_list(input.research_context, "- (none)"),
        tone = tone,
        target = target,
        sections = ARTICLE_SECTIONS
            .iter()
            .map(|s| format!("{}:", s))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    ArticlePrompt::new(writer_system_prompt(input.article_type), user)
}
