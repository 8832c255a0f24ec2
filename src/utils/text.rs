//! Small text helpers shared by agents and the HTTP layer.

use std::time::Duration;

/// Maximum characters of untrusted input echoed into logs.
const MAX_LOG_INPUT_CHARS: usize = 100;

/// Makes caller-supplied text safe to put in a log line.
///
/// Carriage returns and newlines are removed so a value cannot forge extra
/// log records, and long values are cut to 100 characters plus `...`.
pub fn sanitize_log_input(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    if cleaned.chars().count() > MAX_LOG_INPUT_CHARS {
        let mut truncated: String = cleaned.chars().take(MAX_LOG_INPUT_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        cleaned
    }
}

/// Counts whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Human-readable timeout: whole seconds, or milliseconds when sub-second
/// precision matters.
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{} seconds", duration.as_secs())
    } else {
        format!("{} ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_newlines() {
        assert_eq!(sanitize_log_input("123\r\nINFO forged"), "123INFO forged");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(150);
        let sanitized = sanitize_log_input(&long);
        assert_eq!(sanitized.len(), 103);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  Arsenal   beat\nChelsea 2-1 "), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(60)), "60 seconds");
        assert_eq!(format_duration(Duration::from_millis(20)), "20 ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500 ms");
    }
}
