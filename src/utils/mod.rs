//! Shared utility functions for sport-scribe.

pub mod json_extraction;
pub mod text;

pub use json_extraction::{
    find_matching_delimiter, try_extract_json_from_response, JsonExtractionError,
    JsonExtractionResult,
};
pub use text::{format_duration, sanitize_log_input, word_count};
