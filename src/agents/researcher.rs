//! Research Agent for storylines and historical context.
//!
//! Storylines come from one of two strategies:
//!
//! - **Rule-based**: fixed rules over the match result and event counts.
//!   Deterministic and always available.
//! - **Delegated**: the model reads a compact game brief and proposes 3-5
//!   storylines as a JSON array. If that call fails the agent falls back to
//!   the rule-based storylines and reports why, so the pipeline can record a
//!   degradation.
//!
//! Historical context (head-to-head record, league table, team form, player
//! season numbers) is computed from collected data only. When the data is
//! missing the corresponding summary is `None`; nothing is made up.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::football::Envelope;
use crate::llm::{AgentOutput, GenerationRequest, LlmProvider, Message};
use crate::metrics::MetricsCollector;
use crate::prompts::{build_storyline_prompt, STORYLINE_SYSTEM_PROMPT};

use super::collector::aggregates;
use super::error::{AgentError, AgentResult};
use super::extract::{extract_events, extract_fixture_summary, game_record, section_items};

/// Default number of storylines kept.
pub const DEFAULT_STORYLINE_CAP: usize = 5;

/// How storylines are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorylineStrategy {
    RuleBased,
    Delegated,
}

impl FromStr for StorylineStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule_based" | "rule-based" | "rules" => Ok(StorylineStrategy::RuleBased),
            "delegated" | "llm" => Ok(StorylineStrategy::Delegated),
            other => Err(format!(
                "unknown storyline strategy '{}', expected rule_based or delegated",
                other
            )),
        }
    }
}

/// Configuration for the research agent.
#[derive(Debug, Clone)]
pub struct ResearcherConfig {
    pub strategy: StorylineStrategy,
    /// Maximum number of storylines returned.
    pub storyline_cap: usize,
    /// Temperature for delegated storyline generation.
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ResearcherConfig {
    fn default() -> Self {
        Self {
            strategy: StorylineStrategy::Delegated,
            storyline_cap: DEFAULT_STORYLINE_CAP,
            temperature: 0.3,
            max_tokens: 600,
        }
    }
}

impl ResearcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: StorylineStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_storyline_cap(mut self, cap: usize) -> Self {
        self.storyline_cap = cap.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Storylines plus the reason the preferred strategy was abandoned, if it was.
#[derive(Debug, Clone, PartialEq)]
pub struct StorylineOutcome {
    pub storylines: Vec<String>,
    pub fallback_reason: Option<String>,
}

// ============================================================================
// Historical context
// ============================================================================

/// Record between two teams, from the point of view of the first one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadSummary {
    pub team_id: u64,
    pub team_name: Option<String>,
    pub opponent_name: Option<String>,
    pub matches: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Most recent first, e.g. `["W", "D", "L"]`.
    pub recent_results: Vec<String>,
}

impl HeadToHeadSummary {
    pub fn average_goals(&self) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        f64::from(self.goals_for + self.goals_against) / self.matches as f64
    }

    /// One-sentence description for storylines and prompts.
    pub fn describe(&self) -> String {
        let team = self.team_name.as_deref().unwrap_or("The home side");
        let opponent = self.opponent_name.as_deref().unwrap_or("their opponents");
        format!(
            "{} have won {} of the last {} meetings with {} ({} draws, {} losses)",
            team, self.wins, self.matches, opponent, self.draws, self.losses
        )
    }
}

/// One row of a league table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub rank: u32,
    pub team: String,
    pub points: i64,
    pub played: u32,
    pub goal_difference: i64,
    pub form: Option<String>,
}

/// Compact view of a league table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsSummary {
    pub league: Option<String>,
    pub leader: StandingRow,
    pub top: Vec<StandingRow>,
    pub bottom: Vec<StandingRow>,
    pub average_goals_per_game: Option<f64>,
}

/// Season form of one team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamForm {
    pub team_id: Option<u64>,
    pub name: String,
    pub country: Option<String>,
    pub form: Option<String>,
    pub played: Option<u64>,
    pub wins: Option<u64>,
    pub draws: Option<u64>,
    pub losses: Option<u64>,
    pub goals_for: Option<u64>,
    pub goals_against: Option<u64>,
}

/// Season numbers of one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPerformance {
    pub player_id: Option<u64>,
    pub name: String,
    pub age: Option<u64>,
    pub nationality: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub appearances: u64,
    pub minutes: u64,
    pub goals: u64,
    pub assists: u64,
    pub yellow_cards: u64,
    pub red_cards: u64,
    pub rating: Option<f64>,
}

/// Everything the researcher learned beyond storylines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchContext {
    pub head_to_head: Option<HeadToHeadSummary>,
    pub standings: Option<StandingsSummary>,
    pub home_form: Option<TeamForm>,
    pub away_form: Option<TeamForm>,
    pub player: Option<PlayerPerformance>,
}

impl ResearchContext {
    pub fn is_empty(&self) -> bool {
        self.head_to_head.is_none()
            && self.standings.is_none()
            && self.home_form.is_none()
            && self.away_form.is_none()
            && self.player.is_none()
    }
}

fn as_u64(value: Option<&Value>) -> Option<u64> {
    value.and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
}

fn as_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Items of `section` for an aggregate, or the plain response otherwise.
fn items<'a>(envelope: &'a Envelope, aggregate: &str, section: &str) -> &'a [Value] {
    if envelope.get() == aggregate {
        section_items(envelope, section)
    } else {
        envelope.response()
    }
}

/// Head-to-head record of `team_id` against whoever it met in `envelope`.
///
/// Fixtures without a final score are skipped. `None` when no decided
/// fixture involving `team_id` is present.
pub fn analyze_head_to_head(envelope: &Envelope, team_id: u64) -> Option<HeadToHeadSummary> {
    if !envelope.is_success() {
        return None;
    }

    let mut dated: Vec<(String, &Value)> = envelope
        .response()
        .iter()
        .map(|fixture| {
            let date = fixture
                .pointer("/fixture/date")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (date, fixture)
        })
        .collect();
    // ISO-8601 dates sort lexicographically; newest first.
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut summary = HeadToHeadSummary {
        team_id,
        team_name: None,
        opponent_name: None,
        matches: 0,
        wins: 0,
        draws: 0,
        losses: 0,
        goals_for: 0,
        goals_against: 0,
        recent_results: Vec::new(),
    };

    for (_, fixture) in dated {
        let home_id = as_u64(fixture.pointer("/teams/home/id"));
        let away_id = as_u64(fixture.pointer("/teams/away/id"));
        let home_goals = as_u64(fixture.pointer("/goals/home"));
        let away_goals = as_u64(fixture.pointer("/goals/away"));
        let (Some(home_goals), Some(away_goals)) = (home_goals, away_goals) else {
            continue;
        };

        let (own, other, own_side, other_side) = if home_id == Some(team_id) {
            (home_goals, away_goals, "home", "away")
        } else if away_id == Some(team_id) {
            (away_goals, home_goals, "away", "home")
        } else {
            continue;
        };

        if summary.team_name.is_none() {
            summary.team_name = as_string(fixture.pointer(&format!("/teams/{}/name", own_side)));
            summary.opponent_name =
                as_string(fixture.pointer(&format!("/teams/{}/name", other_side)));
        }

        summary.matches += 1;
        summary.goals_for += own as u32;
        summary.goals_against += other as u32;
        let result = match own.cmp(&other) {
            std::cmp::Ordering::Greater => {
                summary.wins += 1;
                "W"
            }
            std::cmp::Ordering::Equal => {
                summary.draws += 1;
                "D"
            }
            std::cmp::Ordering::Less => {
                summary.losses += 1;
                "L"
            }
        };
        if summary.recent_results.len() < 5 {
            summary.recent_results.push(result.to_string());
        }
    }

    (summary.matches > 0).then_some(summary)
}

fn standing_row(value: &Value) -> Option<StandingRow> {
    Some(StandingRow {
        rank: as_u64(value.get("rank"))? as u32,
        team: as_string(value.pointer("/team/name"))?,
        points: value.get("points").and_then(Value::as_i64).unwrap_or(0),
        played: as_u64(value.pointer("/all/played")).unwrap_or(0) as u32,
        goal_difference: value.get("goalsDiff").and_then(Value::as_i64).unwrap_or(0),
        form: as_string(value.get("form")),
    })
}

/// Leader, top three, bottom three and scoring rate of a league table.
///
/// Accepts a `standings` envelope or a `league_data` aggregate.
pub fn analyze_standings(envelope: &Envelope) -> Option<StandingsSummary> {
    if !envelope.is_success() {
        return None;
    }
    let entry = items(envelope, aggregates::LEAGUE_DATA, "standings").first()?;
    let league = entry.get("league")?;

    // The table is a list of groups; a domestic league has exactly one.
    let table = league
        .get("standings")
        .and_then(Value::as_array)
        .and_then(|groups| groups.first())
        .and_then(Value::as_array)?;

    let mut rows: Vec<(StandingRow, &Value)> = table
        .iter()
        .filter_map(|value| standing_row(value).map(|row| (row, value)))
        .collect();
    if rows.is_empty() {
        return None;
    }
    rows.sort_by_key(|(row, _)| row.rank);

    let (goals, played) = rows.iter().fold((0u64, 0u64), |(goals, played), (_, value)| {
        (
            goals + as_u64(value.pointer("/all/goals/for")).unwrap_or(0),
            played + as_u64(value.pointer("/all/played")).unwrap_or(0),
        )
    });
    // Each game is counted once per team, so goals-for over appearances is goals per game / 2.
    let average_goals_per_game = (played > 0).then(|| 2.0 * goals as f64 / played as f64);

    let table: Vec<StandingRow> = rows.into_iter().map(|(row, _)| row).collect();
    let top: Vec<StandingRow> = table.iter().take(3).cloned().collect();
    let bottom: Vec<StandingRow> = table.iter().rev().take(3).rev().cloned().collect();

    Some(StandingsSummary {
        league: as_string(league.get("name")),
        leader: table[0].clone(),
        top,
        bottom,
        average_goals_per_game,
    })
}

/// Season numbers of the player in a `players` envelope or `player_data` aggregate.
///
/// Statistics are summed over every competition entry; the rating is the
/// mean of the entries that carry one.
pub fn summarize_player_performance(envelope: &Envelope) -> Option<PlayerPerformance> {
    if !envelope.is_success() {
        return None;
    }
    let record = if envelope.get() == aggregates::PLAYER_DATA {
        section_items(envelope, "player_stats")
            .first()
            .or_else(|| section_items(envelope, "player_info").first())?
    } else {
        envelope.first()?
    };

    let player = record.get("player")?;
    let mut performance = PlayerPerformance {
        player_id: as_u64(player.get("id")),
        name: as_string(player.get("name"))?,
        age: as_u64(player.get("age")),
        nationality: as_string(player.get("nationality")),
        team: None,
        position: None,
        appearances: 0,
        minutes: 0,
        goals: 0,
        assists: 0,
        yellow_cards: 0,
        red_cards: 0,
        rating: None,
    };

    let mut ratings = Vec::new();
    for stats in record
        .get("statistics")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
    {
        if performance.team.is_none() {
            performance.team = as_string(stats.pointer("/team/name"));
        }
        if performance.position.is_none() {
            performance.position = as_string(stats.pointer("/games/position"));
        }
        performance.appearances += as_u64(stats.pointer("/games/appearences")).unwrap_or(0);
        performance.minutes += as_u64(stats.pointer("/games/minutes")).unwrap_or(0);
        performance.goals += as_u64(stats.pointer("/goals/total")).unwrap_or(0);
        performance.assists += as_u64(stats.pointer("/goals/assists")).unwrap_or(0);
        performance.yellow_cards += as_u64(stats.pointer("/cards/yellow")).unwrap_or(0);
        performance.red_cards += as_u64(stats.pointer("/cards/red")).unwrap_or(0);

        let rating = stats.pointer("/games/rating").and_then(|r| {
            r.as_f64()
                .or_else(|| r.as_str().and_then(|s| s.parse::<f64>().ok()))
        });
        if let Some(rating) = rating {
            ratings.push(rating);
        }
    }

    if !ratings.is_empty() {
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        performance.rating = Some((mean * 100.0).round() / 100.0);
    }

    Some(performance)
}

/// Profile and season form of the team in a `team_data` aggregate.
pub fn summarize_team_data(envelope: &Envelope) -> Option<TeamForm> {
    if !envelope.is_success() {
        return None;
    }
    let info = section_items(envelope, "team_info").first();
    let stats = section_items(envelope, "team_stats").first();

    let name = info
        .and_then(|i| as_string(i.pointer("/team/name")))
        .or_else(|| stats.and_then(|s| as_string(s.pointer("/team/name"))))?;

    let stat = |path: &str| stats.and_then(|s| as_u64(s.pointer(path)));
    let form = stats
        .and_then(|s| as_string(s.get("form")))
        .filter(|f| !f.is_empty())
        .map(|f| {
            let start = f.char_indices().rev().nth(4).map_or(0, |(i, _)| i);
            f[start..].to_string()
        });

    Some(TeamForm {
        team_id: info.and_then(|i| as_u64(i.pointer("/team/id"))),
        name,
        country: info.and_then(|i| as_string(i.pointer("/team/country"))),
        form,
        played: stat("/fixtures/played/total"),
        wins: stat("/fixtures/wins/total"),
        draws: stat("/fixtures/draws/total"),
        losses: stat("/fixtures/loses/total"),
        goals_for: stat("/goals/for/total/total"),
        goals_against: stat("/goals/against/total/total"),
    })
}

// ============================================================================
// Rule-based storylines
// ============================================================================

/// Storylines derived from a game's result and events.
///
/// Accepts a `game_data` aggregate or a fixture-shaped envelope. Returns an
/// empty list when the game has no final score or cannot be read.
pub fn analyze_game_data(game_data: &Envelope) -> Vec<String> {
    let record = if game_data.get() == aggregates::GAME_DATA {
        game_record(game_data)
    } else {
        game_data.clone()
    };

    let Ok(summary) = extract_fixture_summary(&record) else {
        return Vec::new();
    };
    let (Some(home_goals), Some(away_goals)) = (summary.home_goals, summary.away_goals) else {
        return Vec::new();
    };
    let home = &summary.home_team.name;
    let away = &summary.away_team.name;

    let mut storylines = Vec::new();
    if home_goals > away_goals {
        storylines.push(format!("{} secures victory over {}", home, away));
    } else if away_goals > home_goals {
        storylines.push(format!("{} claims away win against {}", away, home));
    } else {
        storylines.push(format!("Thrilling draw between {} and {}", home, away));
    }

    let total = home_goals + away_goals;
    if total >= 5 {
        storylines.push("High-scoring thriller with 5+ goals".to_string());
    } else if total == 0 {
        storylines.push("Defensive masterclass results in goalless draw".to_string());
    }

    let events = extract_events(&record).unwrap_or_default();
    let goal_events = events.iter().filter(|e| e.is_goal()).count();
    let card_events = events.iter().filter(|e| e.is_card()).count();
    if goal_events > 0 {
        storylines.push(format!("Match features {} goals", goal_events));
    }
    if card_events > 5 {
        storylines.push("Physical encounter with multiple cards shown".to_string());
    }

    storylines
}

fn team_storylines(team_data: &Envelope) -> Vec<String> {
    let Some(team) = summarize_team_data(team_data) else {
        return Vec::new();
    };
    let mut storylines = vec![format!("Team form analysis: {}", team.name)];
    if let Some(form) = &team.form {
        storylines.push(format!("{} recent form: {}", team.name, form));
    }
    storylines
}

fn player_storylines(player_data: &Envelope) -> Vec<String> {
    let Some(player) = summarize_player_performance(player_data) else {
        return Vec::new();
    };
    let mut storylines = vec![format!("Player spotlight: {}", player.name)];
    if player.appearances > 0 {
        storylines.push(format!(
            "{} has {} goals and {} assists in {} appearances this season",
            player.name, player.goals, player.assists, player.appearances
        ));
    }
    storylines
}

fn league_storylines(league_data: &Envelope) -> Vec<String> {
    analyze_standings(league_data)
        .map(|standings| {
            let league = standings.league.as_deref().unwrap_or("league");
            vec![format!(
                "{} top the {} table on {} points",
                standings.leader.team, league, standings.leader.points
            )]
        })
        .unwrap_or_default()
}

fn head_to_head_storylines(h2h: &Envelope) -> Vec<String> {
    // The first fixture's home side is used as the reference team.
    let reference = h2h
        .first()
        .and_then(|fixture| as_u64(fixture.pointer("/teams/home/id")));
    reference
        .and_then(|team_id| analyze_head_to_head(h2h, team_id))
        .map(|summary| vec![summary.describe()])
        .unwrap_or_default()
}

/// Rule-based storylines for one envelope, dispatched on its `get` name.
fn storylines_for(envelope: &Envelope) -> Vec<String> {
    if !envelope.is_success() {
        return Vec::new();
    }
    match envelope.get() {
        aggregates::GAME_DATA | "fixtures" => analyze_game_data(envelope),
        aggregates::TEAM_DATA => team_storylines(envelope),
        aggregates::PLAYER_DATA | "players" => player_storylines(envelope),
        aggregates::LEAGUE_DATA | "standings" => league_storylines(envelope),
        aggregates::HEAD_TO_HEAD | "fixtures/headtohead" => head_to_head_storylines(envelope),
        other => {
            tracing::debug!(get = other, "No storyline rules for envelope");
            Vec::new()
        }
    }
}

/// Keeps the first occurrence of each storyline and at most `cap` of them.
fn dedup_and_cap(storylines: impl IntoIterator<Item = String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    storylines
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(cap)
        .collect()
}

/// Rule-based storylines across several envelopes, deduplicated and capped.
pub fn generate_storylines(data_list: &[Envelope], cap: usize) -> Vec<String> {
    dedup_and_cap(data_list.iter().flat_map(storylines_for), cap)
}

// ============================================================================
// Agent
// ============================================================================

/// Research agent producing storylines and historical context.
pub struct ResearchAgent {
    llm: Arc<dyn LlmProvider>,
    config: ResearcherConfig,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for ResearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResearchAgent {
    /// Agent name constant.
    pub const AGENT_NAME: &'static str = "researcher";

    pub fn new(llm: Arc<dyn LlmProvider>, config: ResearcherConfig) -> Self {
        Self {
            llm,
            config,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn config(&self) -> &ResearcherConfig {
        &self.config
    }

    /// Rule-based storylines across `data_list`, capped by the configured limit.
    pub fn generate_storylines(&self, data_list: &[Envelope]) -> Vec<String> {
        generate_storylines(data_list, self.config.storyline_cap)
    }

    /// Asks the model for storylines about one game.
    ///
    /// # Errors
    ///
    /// `MalformedUpstreamData` when the game cannot be summarised,
    /// `GenerationFailed` when the model fails or proposes nothing usable.
    pub async fn storylines_from_game_data(&self, game_data: &Envelope) -> AgentResult<Vec<String>> {
        let record = if game_data.get() == aggregates::GAME_DATA {
            game_record(game_data)
        } else {
            game_data.clone()
        };
        let summary = extract_fixture_summary(&record)
            .map_err(|e| AgentError::MalformedUpstreamData(e.to_string()))?;
        let events = extract_events(&record).unwrap_or_default();

        let brief = serde_json::json!({
            "fixture": summary,
            "events": events,
        });
        let prompt = build_storyline_prompt(&serde_json::to_string_pretty(&brief)?);

        let request = GenerationRequest::new(
            "",
            vec![Message::system(STORYLINE_SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let started = Instant::now();
        let result = self.llm.generate(request).await;
        self.metrics.record_llm_request(
            self.llm.default_model(),
            result.is_ok(),
            started.elapsed().as_secs_f64(),
        );

        let response = result
            .map_err(|e| AgentError::GenerationFailed(format!("storyline generation: {}", e)))?;
        let content = response
            .first_content()
            .ok_or_else(|| AgentError::GenerationFailed("Empty storyline response".to_string()))?;

        let storylines = dedup_and_cap(
            AgentOutput::decode(content).into_string_list(),
            self.config.storyline_cap,
        );
        if storylines.is_empty() {
            return Err(AgentError::GenerationFailed(
                "Model proposed no storylines".to_string(),
            ));
        }

        tracing::debug!(count = storylines.len(), "Delegated storylines generated");
        Ok(storylines)
    }

    /// Storylines for a run: the configured strategy for `game_data`, then
    /// rule-based storylines from `context`, deduplicated and capped.
    pub async fn research_storylines(
        &self,
        game_data: Option<&Envelope>,
        context: &[Envelope],
    ) -> StorylineOutcome {
        let mut fallback_reason = None;
        let mut storylines = Vec::new();

        if let Some(game_data) = game_data {
            match self.config.strategy {
                StorylineStrategy::RuleBased => storylines.extend(analyze_game_data(game_data)),
                StorylineStrategy::Delegated => {
                    match self.storylines_from_game_data(game_data).await {
                        Ok(delegated) => storylines.extend(delegated),
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "Delegated storylines failed, using rule-based storylines"
                            );
                            fallback_reason = Some(e.to_string());
                            storylines.extend(analyze_game_data(game_data));
                        }
                    }
                }
            }
        }

        storylines.extend(context.iter().flat_map(storylines_for));

        StorylineOutcome {
            storylines: dedup_and_cap(storylines, self.config.storyline_cap),
            fallback_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::collector::build_aggregate;
    use crate::football::params;
    use crate::testing::{game_data_aggregate, sample_fixture, sample_fixture_envelope, MockLlmProvider};
    use serde_json::{json, Map};

    fn fixture_with_score(home: &str, away: &str, home_goals: u32, away_goals: u32) -> Envelope {
        let fixture = json!({
            "fixture": {"id": 1, "date": "2024-01-01T15:00:00+00:00"},
            "league": {"id": 39, "name": "Premier League", "season": 2023},
            "teams": {"home": {"id": 1, "name": home}, "away": {"id": 2, "name": away}},
            "goals": {"home": home_goals, "away": away_goals},
            "events": []
        });
        Envelope::success("fixtures", Map::new(), vec![fixture])
    }

    #[test]
    fn test_home_victory_storyline() {
        let storylines = analyze_game_data(&fixture_with_score("Team A", "Team B", 2, 1));
        assert_eq!(storylines, vec!["Team A secures victory over Team B".to_string()]);
    }

    #[test]
    fn test_away_win_and_draw_storylines() {
        let away = analyze_game_data(&fixture_with_score("Team A", "Team B", 0, 3));
        assert_eq!(away[0], "Team B claims away win against Team A");

        let goalless = analyze_game_data(&fixture_with_score("Team A", "Team B", 0, 0));
        assert_eq!(
            goalless,
            vec![
                "Thrilling draw between Team A and Team B".to_string(),
                "Defensive masterclass results in goalless draw".to_string(),
            ]
        );

        let thriller = analyze_game_data(&fixture_with_score("Team A", "Team B", 3, 3));
        assert!(thriller.contains(&"High-scoring thriller with 5+ goals".to_string()));
    }

    #[test]
    fn test_high_scoring_home_win() {
        let storylines = analyze_game_data(&fixture_with_score("Team A", "Team B", 3, 2));
        assert_eq!(
            storylines,
            vec![
                "Team A secures victory over Team B".to_string(),
                "High-scoring thriller with 5+ goals".to_string(),
            ]
        );
    }

    #[test]
    fn test_sample_fixture_storylines() {
        let storylines = analyze_game_data(&sample_fixture_envelope());
        assert_eq!(
            storylines,
            vec![
                "Wydad AC claims away win against Rapide Oued ZEM".to_string(),
                "Match features 3 goals".to_string(),
            ]
        );
    }

    #[test]
    fn test_card_heavy_match() {
        let mut fixture = sample_fixture();
        let card = json!({
            "time": {"elapsed": 50}, "team": {"id": 967}, "player": {"id": 1, "name": "X"},
            "type": "Card", "detail": "Yellow Card"
        });
        fixture["events"] = Value::Array(vec![card; 6]);
        let envelope = Envelope::success("fixtures", Map::new(), vec![fixture]);

        let storylines = analyze_game_data(&envelope);
        assert!(storylines.contains(&"Physical encounter with multiple cards shown".to_string()));
        assert!(!storylines.iter().any(|s| s.starts_with("Match features")));
    }

    #[test]
    fn test_unplayed_fixture_has_no_result_storylines() {
        let mut fixture = sample_fixture();
        fixture["goals"] = json!({"home": null, "away": null});
        let envelope = Envelope::success("fixtures", Map::new(), vec![fixture]);
        assert!(analyze_game_data(&envelope).is_empty());
    }

    #[test]
    fn test_generate_storylines_dedups_caps_and_never_pads() {
        let aggregate = game_data_aggregate(sample_fixture(), json!([]));
        let storylines = generate_storylines(&[aggregate.clone(), aggregate], 5);
        assert_eq!(
            storylines,
            vec![
                "Wydad AC claims away win against Rapide Oued ZEM".to_string(),
                "Match features 3 goals".to_string(),
            ]
        );

        let capped = generate_storylines(&[fixture_with_score("A", "B", 0, 0)], 1);
        assert_eq!(capped.len(), 1);

        assert!(generate_storylines(&[], 5).is_empty());
    }

    #[test]
    fn test_team_and_player_storylines() {
        let team = build_aggregate(
            "team_data",
            Map::new(),
            vec![
                ("team_info", Envelope::success("teams", Map::new(), vec![json!({"team": {"id": 968, "name": "Wydad AC"}})])),
                ("team_stats", Envelope::success("teams/statistics", Map::new(), vec![json!({"form": "WWDLWDW"})])),
            ],
        );
        let player = Envelope::success(
            "players",
            Map::new(),
            vec![json!({
                "player": {"id": 276, "name": "Neymar"},
                "statistics": [{"games": {"appearences": 10}, "goals": {"total": 6, "assists": 4}}]
            })],
        );

        let storylines = generate_storylines(&[team, player], 10);
        assert_eq!(
            storylines,
            vec![
                "Team form analysis: Wydad AC".to_string(),
                "Wydad AC recent form: DLWDW".to_string(),
                "Player spotlight: Neymar".to_string(),
                "Neymar has 6 goals and 4 assists in 10 appearances this season".to_string(),
            ]
        );
    }

    #[test]
    fn test_team_form_keeps_last_five_characters() {
        let team = build_aggregate(
            "team_data",
            Map::new(),
            vec![(
                "team_stats",
                Envelope::success(
                    "teams/statistics",
                    Map::new(),
                    vec![json!({"team": {"id": 85, "name": "Paris SG"}, "form": "WÉLWDW"})],
                ),
            )],
        );

        let form = summarize_team_data(&team).expect("team form");
        assert_eq!(form.name, "Paris SG");
        assert_eq!(form.form.as_deref(), Some("ÉLWDW"));

        let short = build_aggregate(
            "team_data",
            Map::new(),
            vec![(
                "team_stats",
                Envelope::success(
                    "teams/statistics",
                    Map::new(),
                    vec![json!({"team": {"name": "Lyon"}, "form": "ÉW"})],
                ),
            )],
        );
        assert_eq!(summarize_team_data(&short).and_then(|f| f.form).as_deref(), Some("ÉW"));
    }

    fn h2h_fixture(date: &str, home: (u64, &str), away: (u64, &str), goals: (u32, u32)) -> Value {
        json!({
            "fixture": {"date": date},
            "teams": {"home": {"id": home.0, "name": home.1}, "away": {"id": away.0, "name": away.1}},
            "goals": {"home": goals.0, "away": goals.1}
        })
    }

    #[test]
    fn test_analyze_head_to_head() {
        let envelope = Envelope::success(
            "head_to_head",
            params([("h2h", "967-968")]),
            vec![
                h2h_fixture("2019-01-01T00:00:00+00:00", (967, "Rapide"), (968, "Wydad"), (1, 1)),
                h2h_fixture("2020-01-01T00:00:00+00:00", (968, "Wydad"), (967, "Rapide"), (0, 2)),
                h2h_fixture("2018-01-01T00:00:00+00:00", (967, "Rapide"), (968, "Wydad"), (0, 3)),
                json!({"teams": {"home": {"id": 967}, "away": {"id": 968}}, "goals": {"home": null, "away": null}}),
            ],
        );

        let summary = analyze_head_to_head(&envelope, 967).expect("summary");
        assert_eq!(summary.matches, 3);
        assert_eq!((summary.wins, summary.draws, summary.losses), (1, 1, 1));
        assert_eq!((summary.goals_for, summary.goals_against), (3, 4));
        assert_eq!(summary.recent_results, vec!["W", "D", "L"]);
        assert_eq!(summary.team_name.as_deref(), Some("Rapide"));
        assert!(summary.describe().starts_with("Rapide have won 1 of the last 3 meetings"));

        assert!(analyze_head_to_head(&envelope, 1).is_none());
    }

    #[test]
    fn test_analyze_standings() {
        let row = |rank: u32, name: &str, points: i64, played: u64, scored: u64| {
            json!({
                "rank": rank, "team": {"name": name}, "points": points, "goalsDiff": 0,
                "all": {"played": played, "goals": {"for": scored, "against": 0}}
            })
        };
        let envelope = Envelope::success(
            "standings",
            Map::new(),
            vec![json!({"league": {"name": "Premier League", "standings": [[
                row(2, "Arsenal", 80, 38, 50),
                row(1, "Man City", 89, 38, 60),
                row(3, "Liverpool", 78, 38, 40),
                row(4, "Sheffield", 16, 38, 20),
            ]]}})],
        );

        let summary = analyze_standings(&envelope).expect("standings");
        assert_eq!(summary.leader.team, "Man City");
        assert_eq!(summary.top.len(), 3);
        assert_eq!(summary.bottom.last().map(|r| r.team.as_str()), Some("Sheffield"));
        let average = summary.average_goals_per_game.expect("average");
        assert!((average - 2.0 * 170.0 / 152.0).abs() < 1e-9);

        let empty = Envelope::success("standings", Map::new(), Vec::new());
        assert!(analyze_standings(&empty).is_none());
    }

    #[test]
    fn test_summarize_player_performance() {
        let envelope = Envelope::success(
            "players",
            Map::new(),
            vec![json!({
                "player": {"id": 276, "name": "Neymar", "age": 31},
                "statistics": [
                    {"team": {"name": "PSG"}, "games": {"appearences": 20, "minutes": 1700, "rating": "7.50", "position": "Attacker"},
                     "goals": {"total": 13, "assists": 11}, "cards": {"yellow": 3, "red": 0}},
                    {"team": {"name": "PSG"}, "games": {"appearences": 5, "minutes": 400, "rating": "7.00"},
                     "goals": {"total": 2, "assists": null}, "cards": {"yellow": 1, "red": 1}}
                ]
            })],
        );

        let performance = summarize_player_performance(&envelope).expect("performance");
        assert_eq!(performance.appearances, 25);
        assert_eq!(performance.goals, 15);
        assert_eq!(performance.assists, 11);
        assert_eq!(performance.red_cards, 1);
        assert_eq!(performance.rating, Some(7.25));
        assert_eq!(performance.position.as_deref(), Some("Attacker"));
    }

    #[tokio::test]
    async fn test_delegated_storylines_decoded() {
        let llm = Arc::new(MockLlmProvider::new(
            r#"["Wydad snatch late win", "Jabrane penalty decides it", "Wydad snatch late win"]"#,
        ));
        let agent = ResearchAgent::new(llm.clone(), ResearcherConfig::default());

        let storylines = agent
            .storylines_from_game_data(&sample_fixture_envelope())
            .await
            .expect("storylines");
        assert_eq!(storylines, vec!["Wydad snatch late win", "Jabrane penalty decides it"]);

        let request = &llm.requests()[0];
        assert_eq!(request.temperature, Some(0.3));
        assert!(request.messages[1].content.contains("Wydad AC"));
    }

    #[tokio::test]
    async fn test_delegated_text_output_is_split_into_lines() {
        let llm = Arc::new(MockLlmProvider::new("- First storyline\n2. Second storyline\n\n"));
        let agent = ResearchAgent::new(llm, ResearcherConfig::default());
        let storylines = agent
            .storylines_from_game_data(&sample_fixture_envelope())
            .await
            .expect("storylines");
        assert_eq!(storylines, vec!["First storyline", "Second storyline"]);
    }

    #[tokio::test]
    async fn test_delegated_failure_falls_back_to_rules() {
        let agent = ResearchAgent::new(Arc::new(MockLlmProvider::failing()), ResearcherConfig::default());
        let outcome = agent
            .research_storylines(Some(&sample_fixture_envelope()), &[])
            .await;

        assert!(outcome.fallback_reason.is_some());
        assert_eq!(outcome.storylines[0], "Wydad AC claims away win against Rapide Oued ZEM");
    }

    #[tokio::test]
    async fn test_rule_based_strategy_skips_model() {
        let llm = Arc::new(MockLlmProvider::new("[]"));
        let agent = ResearchAgent::new(
            llm.clone(),
            ResearcherConfig::default().with_strategy(StorylineStrategy::RuleBased),
        );
        let outcome = agent
            .research_storylines(Some(&sample_fixture_envelope()), &[])
            .await;

        assert_eq!(llm.call_count(), 0);
        assert!(outcome.fallback_reason.is_none());
        assert_eq!(outcome.storylines.len(), 2);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("rule_based".parse::<StorylineStrategy>(), Ok(StorylineStrategy::RuleBased));
        assert_eq!("Delegated".parse::<StorylineStrategy>(), Ok(StorylineStrategy::Delegated));
        assert!("magic".parse::<StorylineStrategy>().is_err());
    }
}
