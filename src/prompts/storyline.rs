//! Prompt for delegated storyline generation.

/// System prompt for the storyline model.
pub const STORYLINE_SYSTEM_PROMPT: &str = r#"You are a football research analyst working for a sports news desk.

Your job is to read structured match data and name the storylines a journalist should cover.

RULES:
- Use ONLY facts present in the data you are given.
- Do not invent players, scores, records, quotes or history.
- Prefer concrete storylines (who scored, when, what changed) over generic ones.
- Each storyline is one short sentence of at most 15 words.

OUTPUT FORMAT:
Respond with ONLY a JSON array of 3 to 5 strings, for example:
["Late penalty settles a tense derby", "Home side's unbeaten run ends"]

Do not include any text outside the JSON array."#;

/// Builds the user prompt embedding a compact game brief.
pub fn build_storyline_prompt(game_brief: &str) -> String {
    format!(
        r#"## MATCH DATA

```json
{}
```

## TASK

List the 3 to 5 most newsworthy storylines of this match as a JSON array of strings.
Every storyline must be supported by the match data above."#,
        game_brief.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_brief() {
        let prompt = build_storyline_prompt("  {\"home\": \"Wydad AC\"}\n");
        assert!(prompt.contains("{\"home\": \"Wydad AC\"}"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_system_prompt_forbids_invention() {
        assert!(STORYLINE_SYSTEM_PROMPT.contains("Do not invent"));
        assert!(STORYLINE_SYSTEM_PROMPT.contains("ONLY a JSON array"));
    }
}
