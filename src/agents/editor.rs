//! Editor Agent: deterministic review of generated articles.
//!
//! The editor never rewrites an article. It returns the content unchanged
//! together with [`EditorFeedback`] from two checks:
//!
//! - a fact check against the fixture the article is about (team names and
//!   scoreline present)
//! - a style check (length, paragraphs, section markers, sentence length)

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::word_count;

use super::extract::FixtureSummary;
use super::types::ArticleType;
use super::writer::section_markers;

/// Paragraphs longer than this many words are flagged.
const LONG_PARAGRAPH_WORDS: usize = 150;

/// Average sentence length above this is flagged.
const LONG_SENTENCE_AVERAGE: f64 = 30.0;

/// Result of checking an article against its fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheck {
    pub team_names_present: bool,
    /// `None` when the fixture has no final score to check.
    pub scoreline_present: Option<bool>,
    pub verified_facts: Vec<String>,
    pub missing_facts: Vec<String>,
}

impl FactCheck {
    pub fn passed(&self) -> bool {
        self.missing_facts.is_empty()
    }
}

/// Readability and structure measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleReport {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub sections_found: Vec<String>,
    pub average_sentence_length: f64,
    pub long_paragraphs: usize,
    pub issues: Vec<String>,
}

/// Feedback attached to article metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorFeedback {
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check: Option<FactCheck>,
    pub style: StyleReport,
}

/// What the editor knows about the article besides its text.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
    pub article_type: Option<ArticleType>,
    pub fixture: Option<FixtureSummary>,
}

fn scoreline_pattern(first: u32, second: u32) -> Option<Regex> {
    // Accepts "2-1", "2 - 1" and en-dash variants.
    Regex::new(&format!(r"\b{}\s*[-–]\s*{}\b", first, second)).ok()
}

/// Checks that the article names both teams and states the final score.
pub fn fact_check(content: &str, fixture: &FixtureSummary) -> FactCheck {
    let lowered = content.to_lowercase();
    let mut verified = Vec::new();
    let mut missing = Vec::new();

    let mut team_names_present = true;
    for team in [&fixture.home_team.name, &fixture.away_team.name] {
        if lowered.contains(&team.to_lowercase()) {
            verified.push(format!("team name '{}'", team));
        } else {
            team_names_present = false;
            missing.push(format!("team name '{}'", team));
        }
    }

    let scoreline_present = match (fixture.home_goals, fixture.away_goals) {
        (Some(home), Some(away)) => {
            // Reports often lead with the winner's score, so both orders count.
            let present = [scoreline_pattern(home, away), scoreline_pattern(away, home)]
                .into_iter()
                .flatten()
                .any(|re| re.is_match(content));
            let fact = format!("scoreline {}-{}", home, away);
            if present {
                verified.push(fact);
            } else {
                missing.push(fact);
            }
            Some(present)
        }
        _ => None,
    };

    FactCheck {
        team_names_present,
        scoreline_present,
        verified_facts: verified,
        missing_facts: missing,
    }
}

/// Measures length, structure and sentence length.
pub fn style_check(content: &str) -> StyleReport {
    let paragraphs: Vec<&str> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let sentences: Vec<&str> = content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let words = word_count(content);
    let average_sentence_length = if sentences.is_empty() {
        0.0
    } else {
        words as f64 / sentences.len() as f64
    };

    let long_paragraphs = paragraphs
        .iter()
        .filter(|p| word_count(p) > LONG_PARAGRAPH_WORDS)
        .count();
    let sections_found: Vec<String> = section_markers(content)
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut issues = Vec::new();
    if sections_found.len() < 4 {
        issues.push(format!(
            "Only {} of 4 template sections found",
            sections_found.len()
        ));
    }
    if long_paragraphs > 0 {
        issues.push(format!(
            "{} paragraph(s) longer than {} words",
            long_paragraphs, LONG_PARAGRAPH_WORDS
        ));
    }
    if average_sentence_length > LONG_SENTENCE_AVERAGE {
        issues.push(format!(
            "Average sentence length {:.1} words exceeds {}",
            average_sentence_length, LONG_SENTENCE_AVERAGE
        ));
    }

    StyleReport {
        word_count: words,
        paragraph_count: paragraphs.len(),
        sections_found,
        average_sentence_length,
        long_paragraphs,
        issues,
    }
}

/// Editor agent.
#[derive(Debug, Clone, Default)]
pub struct EditorAgent;

impl EditorAgent {
    /// Agent name constant.
    pub const AGENT_NAME: &'static str = "editor";

    pub fn new() -> Self {
        Self
    }

    /// Reviews an article. The content is returned unchanged.
    pub fn review_article(&self, content: &str, context: &ReviewContext) -> (String, EditorFeedback) {
        let fact_check = context.fixture.as_ref().map(|f| fact_check(content, f));
        let style = style_check(content);
        let approved = fact_check.as_ref().map_or(true, FactCheck::passed) && style.issues.is_empty();

        tracing::info!(
            approved = approved,
            words = style.word_count,
            style_issues = style.issues.len(),
            missing_facts = fact_check.as_ref().map_or(0, |f| f.missing_facts.len()),
            "Article reviewed"
        );

        (
            content.to_string(),
            EditorFeedback {
                approved,
                fact_check,
                style,
            },
        )
    }
}
