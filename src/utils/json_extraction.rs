//! JSON extraction from mixed LLM output.
//!
//! Models asked for "ONLY a JSON array" still wrap it in prose or markdown
//! fences often enough that callers cannot `serde_json::from_str` the raw
//! completion. Extraction order:
//!
//! 1. fenced code block (```json or bare ```)
//! 2. the whole trimmed content, when it opens with `{` or `[`
//! 3. the first balanced object/array found anywhere in the text
//!
//! # Example
//!
//! ```
//! use sport_scribe::utils::json_extraction::try_extract_json_from_response;
//!
//! let reply = "Here you go:\n```json\n[\"Arsenal edge derby\"]\n```";
//! let json = try_extract_json_from_response(reply).into_result().unwrap();
//! assert_eq!(json, "[\"Arsenal edge derby\"]");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Error type for JSON extraction failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JsonExtractionError {
    #[error("JSON appears truncated: {unclosed} unclosed delimiters. Partial: {partial_preview}...")]
    Truncated {
        partial_preview: String,
        unclosed: usize,
    },
    #[error("No JSON content found in response. Content starts with: '{content_preview}'")]
    NotFound { content_preview: String },
}

/// Result of a JSON extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonExtractionResult {
    /// Extracted text that parses as JSON.
    Success(String),
    /// JSON started but never closed.
    Truncated { partial_json: String, unclosed: usize },
    NotFound,
}

impl JsonExtractionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JsonExtractionResult::Success(_))
    }

    /// Converts the result to a `Result`.
    pub fn into_result(self) -> Result<String, JsonExtractionError> {
        self.into_result_with_context("")
    }

    /// Converts the result to a `Result`, previewing `content` when nothing was found.
    pub fn into_result_with_context(self, content: &str) -> Result<String, JsonExtractionError> {
        match self {
            JsonExtractionResult::Success(json) => Ok(json),
            JsonExtractionResult::Truncated {
                partial_json,
                unclosed,
            } => Err(JsonExtractionError::Truncated {
                partial_preview: preview(&partial_json, 100),
                unclosed,
            }),
            JsonExtractionResult::NotFound => Err(JsonExtractionError::NotFound {
                content_preview: preview(content.trim(), 50),
            }),
        }
    }
}

fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("Invalid regex for code blocks")
});

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

/// Attempts to extract JSON from an LLM response.
pub fn try_extract_json_from_response(content: &str) -> JsonExtractionResult {
    let trimmed = content.trim();

    for captures in CODE_BLOCK.captures_iter(trimmed) {
        if let Some(body) = captures.get(1) {
            let body = body.as_str().trim();
            if parses(body) {
                return JsonExtractionResult::Success(body.to_string());
            }
        }
    }

    if (trimmed.starts_with('{') || trimmed.starts_with('[')) && parses(trimmed) {
        return JsonExtractionResult::Success(trimmed.to_string());
    }

    let mut truncated = None;
    for (start, c) in trimmed.char_indices() {
        if c != '{' && c != '[' {
            continue;
        }
        let tail = &trimmed[start..];
        match find_matching_delimiter(tail) {
            Some(end) => {
                let candidate = &tail[..=end];
                if parses(candidate) {
                    return JsonExtractionResult::Success(candidate.to_string());
                }
            }
            None if truncated.is_none() => {
                let unclosed = unclosed_delimiters(tail);
                if unclosed > 0 {
                    truncated = Some(JsonExtractionResult::Truncated {
                        partial_json: tail.to_string(),
                        unclosed,
                    });
                }
            }
            None => {}
        }
    }

    truncated.unwrap_or(JsonExtractionResult::NotFound)
}

/// Finds the index of the delimiter closing the `{` or `[` at the start of `s`.
///
/// String literals and escape sequences are skipped, so braces inside
/// quoted text do not affect depth.
pub fn find_matching_delimiter(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn unclosed_delimiters(s: &str) -> usize {
    let mut depth: isize = 0;
    let mut in_string = false;
    let mut escape_next = false;
    for c in s.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_array() {
        let result = try_extract_json_from_response(r#"["a", "b"]"#);
        assert_eq!(result, JsonExtractionResult::Success(r#"["a", "b"]"#.to_string()));
    }

    #[test]
    fn test_markdown_block() {
        let content = "Sure!\n```json\n{\"headline\": \"Late drama\"}\n```\nEnjoy.";
        let json = try_extract_json_from_response(content)
            .into_result()
            .expect("should extract");
        assert_eq!(json, r#"{"headline": "Late drama"}"#);
    }

    #[test]
    fn test_embedded_in_prose() {
        let content = r#"The storylines are ["City win 3-0", "Haaland brace"] as requested."#;
        let json = try_extract_json_from_response(content)
            .into_result()
            .expect("should extract");
        assert_eq!(json, r#"["City win 3-0", "Haaland brace"]"#);
    }

    #[test]
    fn test_braces_inside_strings() {
        let content = r#"{"text": "a } inside", "n": 1}"#;
        assert!(try_extract_json_from_response(content).is_success());
        assert_eq!(find_matching_delimiter(content), Some(content.len() - 1));
    }

    #[test]
    fn test_truncated() {
        let result = try_extract_json_from_response(r#"["one", "two"#);
        assert!(matches!(result, JsonExtractionResult::Truncated { .. }));
        let err = result.into_result().expect_err("truncated is an error");
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_not_found_includes_preview() {
        let err = try_extract_json_from_response("no json at all")
            .into_result_with_context("no json at all")
            .expect_err("nothing to extract");
        assert_eq!(
            err,
            JsonExtractionError::NotFound {
                content_preview: "no json at all".to_string()
            }
        );
    }
}
