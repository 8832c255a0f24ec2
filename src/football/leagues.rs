//! Well-known competitions and small formatting helpers.

use chrono::{DateTime, Utc};

/// A competition known by a stable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct League {
    pub key: &'static str,
    pub id: u32,
    pub display_name: &'static str,
}

pub const LEAGUES: &[League] = &[
    League { key: "premier_league", id: 39, display_name: "Premier League" },
    League { key: "la_liga", id: 140, display_name: "La Liga" },
    League { key: "serie_a", id: 135, display_name: "Serie A" },
    League { key: "bundesliga", id: 78, display_name: "Bundesliga" },
    League { key: "ligue_1", id: 61, display_name: "Ligue 1" },
    League { key: "champions_league", id: 2, display_name: "UEFA Champions League" },
    League { key: "europa_league", id: 3, display_name: "UEFA Europa League" },
    League { key: "world_cup", id: 1, display_name: "FIFA World Cup" },
];

/// Looks up a league by key (`"premier_league"`) or numeric id (`"39"`).
pub fn find_league(key_or_id: &str) -> Option<&'static League> {
    let needle = key_or_id.trim().to_lowercase();
    match needle.parse::<u32>() {
        Ok(id) => LEAGUES.iter().find(|l| l.id == id),
        Err(_) => LEAGUES.iter().find(|l| l.key == needle),
    }
}

/// Human-readable name for a league id, or `"League {id}"` when unknown.
pub fn league_display_name(id: u32) -> String {
    LEAGUES
        .iter()
        .find(|l| l.id == id)
        .map(|l| l.display_name.to_string())
        .unwrap_or_else(|| format!("League {}", id))
}

/// Compact scoreline, e.g. `"2-1"`.
pub fn format_match_score(home_goals: u32, away_goals: u32) -> String {
    format!("{}-{}", home_goals, away_goals)
}

/// URL slug for an article: lowercase words joined by hyphens, then the date.
pub fn article_slug(headline: &str, published: DateTime<Utc>) -> String {
    let words: Vec<String> = headline
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!("{}-{}", words.join("-"), published.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_find_league_by_key_and_id() {
        assert_eq!(find_league("premier_league").map(|l| l.id), Some(39));
        assert_eq!(find_league(" 140 ").map(|l| l.key), Some("la_liga"));
        assert!(find_league("sunday_league").is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(league_display_name(78), "Bundesliga");
        assert_eq!(league_display_name(999), "League 999");
    }

    #[test]
    fn test_format_match_score() {
        assert_eq!(format_match_score(3, 0), "3-0");
    }

    #[test]
    fn test_article_slug() {
        let date = Utc.with_ymd_and_hms(2024, 5, 19, 15, 0, 0).unwrap();
        assert_eq!(
            article_slug("City clinch the title, again!", date),
            "city-clinch-the-title-again-20240519"
        );
    }
}
