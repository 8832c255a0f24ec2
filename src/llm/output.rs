//! Decoding of raw completions into agent-consumable output.
//!
//! Some call sites want free text (articles), others want structured JSON
//! (storyline arrays). Both go through [`AgentOutput::decode`], so there is
//! exactly one place that decides how a completion is interpreted.

use serde_json::Value;

use crate::utils::json_extraction::{try_extract_json_from_response, JsonExtractionResult};

/// A completion after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    /// The completion was JSON, either bare or in a single fenced block.
    Structured(Value),
    /// Anything else, trimmed.
    Text(String),
}

/// Object keys that may wrap a list of storylines.
const LIST_KEYS: &[&str] = &["storylines", "items", "results"];

/// Object keys that may hold the text of a single list item or article.
const TEXT_KEYS: &[&str] = &["storyline", "text", "title", "content", "article"];

impl AgentOutput {
    /// Decodes a raw completion.
    ///
    /// Only a completion that is JSON as a whole becomes `Structured`; JSON
    /// fragments embedded in prose stay `Text` so article bodies that quote
    /// bracketed material are never misread.
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if value.is_object() || value.is_array() {
                return AgentOutput::Structured(value);
            }
        }

        let fenced = trimmed.starts_with("```") && trimmed.ends_with("```");
        if fenced {
            if let JsonExtractionResult::Success(json) = try_extract_json_from_response(trimmed) {
                if let Ok(value) = serde_json::from_str::<Value>(&json) {
                    return AgentOutput::Structured(value);
                }
            }
        }

        AgentOutput::Text(trimmed.to_string())
    }

    /// Returns true for `Structured` output.
    pub fn is_structured(&self) -> bool {
        matches!(self, AgentOutput::Structured(_))
    }

    /// Interprets the output as a list of short strings.
    ///
    /// Text output first gets one chance to yield an embedded JSON array;
    /// otherwise each non-empty line becomes an item with bullet or number
    /// markers stripped.
    pub fn into_string_list(self) -> Vec<String> {
        match self {
            AgentOutput::Structured(value) => strings_from_value(&value),
            AgentOutput::Text(text) => {
                if let JsonExtractionResult::Success(json) = try_extract_json_from_response(&text)
                {
                    if let Ok(value) = serde_json::from_str::<Value>(&json) {
                        let items = strings_from_value(&value);
                        if !items.is_empty() {
                            return items;
                        }
                    }
                }
                text.lines()
                    .map(strip_list_marker)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }
    }

    /// Interprets the output as one block of text.
    pub fn into_text(self) -> String {
        match self {
            AgentOutput::Text(text) => text,
            AgentOutput::Structured(value) => text_field(&value)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

fn text_field(value: &Value) -> Option<&str> {
    TEXT_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
}

fn strings_from_value(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => {
            match LIST_KEYS
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_array))
            {
                Some(items) => items,
                None => return text_field(value).map(|s| vec![s.to_string()]).unwrap_or_default(),
            }
        }
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim()),
            other => text_field(other).map(str::trim),
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let without_bullet = line.trim_start_matches(['-', '*', '•']).trim_start();
    if without_bullet.len() != line.len() {
        return without_bullet;
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim_start();
        }
    }
    line
}
