//! Pure projections of collected football data.
//!
//! The collector hands back loosely-typed JSON. Everything downstream wants
//! typed views: who played, who scored, what the score was. The functions
//! here produce those views without I/O and without panicking on odd input.
//! Given the same record they always return the same value.
//!
//! Inputs are fixture-shaped envelopes (`response[0]` holds `fixture`,
//! `league`, `teams`, `goals`, `events`, `lineups`). A `game_data` aggregate
//! from the collector is turned into one with [`game_record`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::football::{format_match_score, Envelope};

// ============================================================================
// Errors
// ============================================================================

/// Why a record could not be projected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("Source data reported errors: {0}")]
    FailedSource(String),

    #[error("No data found in response")]
    EmptyResponse,

    #[error("Missing field '{0}' in fixture record")]
    MissingField(&'static str),

    #[error("Malformed fixture record: {0}")]
    Malformed(String),
}

/// Serializes as `{"error": "<message>"}`.
impl Serialize for ExtractionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.to_string())?;
        map.end()
    }
}

// ============================================================================
// Raw upstream shape
// ============================================================================

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    fixture: Option<RawFixture>,
    league: Option<RawLeague>,
    teams: Option<RawTeams>,
    goals: Option<RawGoals>,
    score: Option<RawScore>,
    #[serde(default, deserialize_with = "nullable_vec")]
    events: Vec<RawEvent>,
    #[serde(default, deserialize_with = "nullable_vec")]
    lineups: Vec<RawLineup>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFixture {
    id: Option<u64>,
    referee: Option<String>,
    date: Option<String>,
    venue: Option<RawVenue>,
    status: Option<RawStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVenue {
    name: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStatus {
    long: Option<String>,
    short: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLeague {
    id: Option<u64>,
    name: Option<String>,
    country: Option<String>,
    season: Option<u32>,
    round: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeams {
    home: Option<RawTeam>,
    away: Option<RawTeam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawTeam {
    id: Option<u64>,
    name: Option<String>,
    logo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGoals {
    home: Option<u32>,
    away: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawScore {
    halftime: Option<RawGoals>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPerson {
    id: Option<u64>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTime {
    elapsed: Option<u32>,
    extra: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvent {
    time: Option<RawTime>,
    team: Option<RawTeam>,
    player: Option<RawPerson>,
    assist: Option<RawPerson>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    detail: Option<String>,
    comments: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLineup {
    team: Option<RawTeam>,
    coach: Option<RawPerson>,
    formation: Option<String>,
    #[serde(rename = "startXI", default, deserialize_with = "nullable_vec")]
    start_xi: Vec<RawSlot>,
    #[serde(default, deserialize_with = "nullable_vec")]
    substitutes: Vec<RawSlot>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSlot {
    player: Option<RawSlotPlayer>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSlotPlayer {
    id: Option<u64>,
    name: Option<String>,
    number: Option<u32>,
    pos: Option<String>,
}

fn first_record(raw: &Envelope) -> Result<RawRecord, ExtractionError> {
    if !raw.is_success() {
        return Err(ExtractionError::FailedSource(raw.errors().join("; ")));
    }
    let first = raw.first().ok_or(ExtractionError::EmptyResponse)?;
    if !first.is_object() {
        return Err(ExtractionError::Malformed(
            "response[0] is not an object".to_string(),
        ));
    }
    RawRecord::deserialize(first).map_err(|e| ExtractionError::Malformed(e.to_string()))
}

// ============================================================================
// Typed views
// ============================================================================

/// Which side of the fixture a team or player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRef {
    pub id: Option<u64>,
    pub name: String,
    pub logo: Option<String>,
}

impl From<RawTeam> for TeamRef {
    fn from(raw: RawTeam) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_else(|| "Unknown".to_string()),
            logo: raw.logo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueRef {
    pub id: Option<u64>,
    pub name: String,
    pub country: Option<String>,
    pub season: Option<u32>,
    pub round: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub id: Option<u64>,
    pub name: String,
    pub number: Option<u32>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineup {
    pub formation: Option<String>,
    pub coach: Option<String>,
    pub starting_xi: Vec<RosterEntry>,
    pub substitutes: Vec<RosterEntry>,
}

/// `{home_team, away_team, league, home_lineup, away_lineup}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamInfo {
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub league: LeagueRef,
    /// Absent for fixtures that have not published lineups yet.
    pub home_lineup: Option<Lineup>,
    pub away_lineup: Option<Lineup>,
}

/// One match event (goal, card, substitution, VAR decision).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvent {
    pub minute: Option<u32>,
    pub extra_minute: Option<u32>,
    pub team_id: Option<u64>,
    pub team: String,
    pub player_id: Option<u64>,
    pub player: String,
    pub assist: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub detail: String,
    pub comments: Option<String>,
}

impl MatchEvent {
    pub fn is_goal(&self) -> bool {
        self.event_type == "Goal"
    }

    pub fn is_card(&self) -> bool {
        matches!(self.event_type.as_str(), "Card" | "Yellow Card" | "Red Card")
    }

    /// `45+2'` style minute label.
    pub fn minute_label(&self) -> String {
        match (self.minute, self.extra_minute) {
            (Some(m), Some(extra)) if extra > 0 => format!("{}+{}'", m, extra),
            (Some(m), _) => format!("{}'", m),
            (None, _) => "?'".to_string(),
        }
    }
}

impl From<RawEvent> for MatchEvent {
    fn from(raw: RawEvent) -> Self {
        let time = raw.time.unwrap_or_default();
        let team = raw.team.unwrap_or_default();
        let player = raw.player.unwrap_or_default();
        Self {
            minute: time.elapsed,
            extra_minute: time.extra,
            team_id: team.id,
            team: team.name.unwrap_or_else(|| "Unknown".to_string()),
            player_id: player.id,
            player: player.name.unwrap_or_else(|| "Unknown".to_string()),
            assist: raw.assist.and_then(|a| a.name),
            event_type: raw.event_type.unwrap_or_default(),
            detail: raw.detail.unwrap_or_default(),
            comments: raw.comments,
        }
    }
}

/// Whether a player started or came off the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineupStatus {
    Starting,
    Substitute,
}

/// Headline contribution of a key player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyAchievement {
    /// Type of the player's first decisive event, "Goal" or "Card".
    #[serde(rename = "type")]
    pub event_type: String,
    pub detail: String,
    pub minute: Option<u32>,
    /// e.g. "Scored 2 goals, Received a yellow card".
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerEntry {
    pub id: u64,
    pub name: String,
    pub number: Option<u32>,
    pub position: Option<String>,
    pub team: String,
    pub side: TeamSide,
    pub status: LineupStatus,
    pub match_events: Vec<MatchEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_achievement: Option<KeyAchievement>,
}

/// `{home_players, away_players, all_players, key_players}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub home_players: Vec<PlayerEntry>,
    pub away_players: Vec<PlayerEntry>,
    /// Keyed by player id.
    pub all_players: BTreeMap<u64, PlayerEntry>,
    /// Players with a goal or card event, in lineup order.
    pub key_players: Vec<PlayerEntry>,
}

/// Flat description of one fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureSummary {
    pub fixture_id: Option<u64>,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub halftime_home: Option<u32>,
    pub halftime_away: Option<u32>,
    pub date: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub status: Option<String>,
    pub status_short: Option<String>,
    pub referee: Option<String>,
    pub league: LeagueRef,
}

impl FixtureSummary {
    /// True once both scores are known.
    pub fn has_result(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }

    /// `"2-1"`, or `None` before kick-off.
    pub fn scoreline(&self) -> Option<String> {
        match (self.home_goals, self.away_goals) {
            (Some(h), Some(a)) => Some(format_match_score(h, a)),
            _ => None,
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

fn require_teams(record: &mut RawRecord) -> Result<(TeamRef, TeamRef), ExtractionError> {
    let teams = record
        .teams
        .take()
        .ok_or(ExtractionError::MissingField("teams"))?;
    let home = teams.home.ok_or(ExtractionError::MissingField("teams.home"))?;
    let away = teams.away.ok_or(ExtractionError::MissingField("teams.away"))?;
    Ok((home.into(), away.into()))
}

fn league_ref(raw: Option<RawLeague>) -> Result<LeagueRef, ExtractionError> {
    let raw = raw.ok_or(ExtractionError::MissingField("league"))?;
    Ok(LeagueRef {
        id: raw.id,
        name: raw.name.unwrap_or_else(|| "Unknown League".to_string()),
        country: raw.country,
        season: raw.season,
        round: raw.round,
    })
}

fn roster(slots: Vec<RawSlot>) -> Vec<RosterEntry> {
    slots
        .into_iter()
        .filter_map(|slot| slot.player)
        .map(|p| RosterEntry {
            id: p.id,
            name: p.name.unwrap_or_else(|| "Unknown".to_string()),
            number: p.number,
            position: p.pos,
        })
        .collect()
}

/// Assigns lineups to sides by team id, falling back to list order.
fn split_lineups(
    lineups: Vec<RawLineup>,
    home_id: Option<u64>,
    away_id: Option<u64>,
) -> (Option<RawLineup>, Option<RawLineup>) {
    let mut home = None;
    let mut away = None;
    let mut unmatched = Vec::new();

    for lineup in lineups {
        let team_id = lineup.team.as_ref().and_then(|t| t.id);
        match team_id {
            Some(id) if Some(id) == home_id && home.is_none() => home = Some(lineup),
            Some(id) if Some(id) == away_id && away.is_none() => away = Some(lineup),
            _ => unmatched.push(lineup),
        }
    }

    let mut unmatched = unmatched.into_iter();
    if home.is_none() {
        home = unmatched.next();
    }
    if away.is_none() {
        away = unmatched.next();
    }
    (home, away)
}

fn lineup_view(raw: RawLineup) -> Lineup {
    Lineup {
        formation: raw.formation,
        coach: raw.coach.and_then(|c| c.name),
        starting_xi: roster(raw.start_xi),
        substitutes: roster(raw.substitutes),
    }
}

/// Projects teams, league and lineups out of a fixture record.
pub fn extract_team_info(raw: &Envelope) -> Result<TeamInfo, ExtractionError> {
    let mut record = first_record(raw)?;
    let (home_team, away_team) = require_teams(&mut record)?;
    let league = league_ref(record.league.take())?;
    let (home_lineup, away_lineup) =
        split_lineups(std::mem::take(&mut record.lineups), home_team.id, away_team.id);

    Ok(TeamInfo {
        home_team,
        away_team,
        league,
        home_lineup: home_lineup.map(lineup_view),
        away_lineup: away_lineup.map(lineup_view),
    })
}

/// Projects the match events of a fixture record, in upstream order.
///
/// A record without events yields an empty list; only an unusable record is an error.
pub fn extract_events(raw: &Envelope) -> Result<Vec<MatchEvent>, ExtractionError> {
    let record = first_record(raw)?;
    Ok(record.events.into_iter().map(MatchEvent::from).collect())
}

/// Projects the flat fixture summary used by research and writing.
pub fn extract_fixture_summary(raw: &Envelope) -> Result<FixtureSummary, ExtractionError> {
    let mut record = first_record(raw)?;
    let (home_team, away_team) = require_teams(&mut record)?;
    let league = league_ref(record.league.take())?;
    let fixture = record.fixture.unwrap_or_default();
    let venue = fixture.venue.unwrap_or_default();
    let status = fixture.status.unwrap_or_default();
    let goals = record.goals.unwrap_or_default();
    let halftime = record.score.and_then(|s| s.halftime).unwrap_or_default();

    Ok(FixtureSummary {
        fixture_id: fixture.id,
        home_team,
        away_team,
        home_goals: goals.home,
        away_goals: goals.away,
        halftime_home: halftime.home,
        halftime_away: halftime.away,
        date: fixture.date,
        venue: venue.name,
        city: venue.city,
        status: status.long,
        status_short: status.short,
        referee: fixture.referee,
        league,
    })
}

fn key_achievement(events: &[MatchEvent]) -> Option<KeyAchievement> {
    let first = events.iter().find(|e| e.is_goal() || e.is_card())?;

    let goals = events
        .iter()
        .filter(|e| e.is_goal() && !matches!(e.detail.as_str(), "Own Goal" | "Missed Penalty"))
        .count();
    let own_goals = events
        .iter()
        .filter(|e| e.is_goal() && e.detail == "Own Goal")
        .count();
    let missed_penalties = events
        .iter()
        .filter(|e| e.is_goal() && e.detail == "Missed Penalty")
        .count();
    let yellow = events
        .iter()
        .filter(|e| e.is_card() && e.detail.contains("Yellow"))
        .count();
    let red = events
        .iter()
        .filter(|e| e.is_card() && e.detail.contains("Red"))
        .count();

    let mut parts = Vec::new();
    match goals {
        0 => {}
        1 => parts.push("Scored 1 goal".to_string()),
        n => parts.push(format!("Scored {} goals", n)),
    }
    if own_goals > 0 {
        parts.push("Scored an own goal".to_string());
    }
    if missed_penalties > 0 {
        parts.push("Missed a penalty".to_string());
    }
    if yellow > 0 {
        parts.push("Received a yellow card".to_string());
    }
    if red > 0 {
        parts.push("Received a red card".to_string());
    }
    if parts.is_empty() {
        parts.push(first.detail.clone());
    }

    Some(KeyAchievement {
        event_type: first.event_type.clone(),
        detail: first.detail.clone(),
        minute: first.minute,
        summary: parts.join(", "),
    })
}

/// Joins lineup rosters with match events by player id.
pub fn extract_player_info(raw: &Envelope) -> Result<PlayerInfo, ExtractionError> {
    let mut record = first_record(raw)?;
    let (home_team, away_team) = require_teams(&mut record)?;
    let events: Vec<MatchEvent> = std::mem::take(&mut record.events)
        .into_iter()
        .map(MatchEvent::from)
        .collect();

    let mut events_by_player: BTreeMap<u64, Vec<MatchEvent>> = BTreeMap::new();
    for event in &events {
        if let Some(id) = event.player_id {
            events_by_player.entry(id).or_default().push(event.clone());
        }
    }

    let (home_lineup, away_lineup) =
        split_lineups(std::mem::take(&mut record.lineups), home_team.id, away_team.id);

    let build_side = |lineup: Option<RawLineup>, side: TeamSide, team: &TeamRef| {
        let Some(lineup) = lineup else {
            return Vec::new();
        };
        let starters = roster(lineup.start_xi)
            .into_iter()
            .map(|entry| (entry, LineupStatus::Starting));
        let subs = roster(lineup.substitutes)
            .into_iter()
            .map(|entry| (entry, LineupStatus::Substitute));

        starters
            .chain(subs)
            .filter_map(|(entry, status)| {
                let id = entry.id?;
                let match_events = events_by_player.get(&id).cloned().unwrap_or_default();
                let key_achievement = key_achievement(&match_events);
                Some(PlayerEntry {
                    id,
                    name: entry.name,
                    number: entry.number,
                    position: entry.position,
                    team: team.name.clone(),
                    side,
                    status,
                    match_events,
                    key_achievement,
                })
            })
            .collect::<Vec<_>>()
    };

    let home_players = build_side(home_lineup, TeamSide::Home, &home_team);
    let away_players = build_side(away_lineup, TeamSide::Away, &away_team);

    let mut all_players = BTreeMap::new();
    for player in home_players.iter().chain(away_players.iter()) {
        all_players.entry(player.id).or_insert_with(|| player.clone());
    }

    let key_players = home_players
        .iter()
        .chain(away_players.iter())
        .filter(|p| p.key_achievement.is_some())
        .cloned()
        .collect();

    Ok(PlayerInfo {
        home_players,
        away_players,
        all_players,
        key_players,
    })
}

// ============================================================================
// Aggregate access
// ============================================================================

/// Items of one section (`fixture`, `events`, ...) of a collector aggregate.
///
/// Empty when the section is missing or its sub-call failed.
pub fn section_items<'a>(aggregate: &'a Envelope, section: &str) -> &'a [Value] {
    aggregate
        .first()
        .and_then(|record| record.get(section))
        .and_then(|sub| sub.get("response"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Errors reported by one section of a collector aggregate.
pub fn section_errors(aggregate: &Envelope, section: &str) -> Vec<String> {
    aggregate
        .first()
        .and_then(|record| record.get(section))
        .and_then(|sub| sub.get("errors"))
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Builds a fixture-shaped envelope from a `game_data` aggregate.
///
/// The fixture item is taken from the `fixture` section; its `events` and
/// `lineups` are filled from the dedicated sections when the fixture item
/// does not already carry them.
pub fn game_record(aggregate: &Envelope) -> Envelope {
    if !aggregate.is_success() {
        return aggregate.clone();
    }

    let Some(fixture) = section_items(aggregate, "fixture").first() else {
        return Envelope::success("fixtures", aggregate.parameters().clone(), Vec::new());
    };

    let mut merged = fixture.clone();
    if let Value::Object(map) = &mut merged {
        for key in ["events", "lineups", "statistics"] {
            let present = map
                .get(key)
                .and_then(Value::as_array)
                .is_some_and(|items| !items.is_empty());
            let items = section_items(aggregate, key);
            if !present && !items.is_empty() {
                map.insert(key.to_string(), Value::Array(items.to_vec()));
            }
        }
    }

    Envelope::success("fixtures", aggregate.parameters().clone(), vec![merged])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::football::params;
    use crate::testing::{game_data_aggregate, sample_fixture_envelope};
    use serde_json::{json, Map};

    #[test]
    fn test_extract_team_info() {
        let info = extract_team_info(&sample_fixture_envelope()).expect("team info");
        assert_eq!(info.home_team.name, "Rapide Oued ZEM");
        assert_eq!(info.away_team.id, Some(968));
        assert_eq!(info.league.round.as_deref(), Some("Regular Season - 14"));

        let home = info.home_lineup.expect("home lineup");
        assert_eq!(home.formation.as_deref(), Some("4-3-3"));
        assert_eq!(home.coach.as_deref(), Some("M. Chebil"));
        assert_eq!(home.starting_xi.len(), 3);
        assert_eq!(info.away_lineup.expect("away lineup").substitutes.len(), 2);
    }

    #[test]
    fn test_extract_player_info_key_players() {
        let info = extract_player_info(&sample_fixture_envelope()).expect("player info");
        assert_eq!(info.home_players.len(), 5);
        assert_eq!(info.away_players.len(), 5);
        assert_eq!(info.all_players.len(), 10);

        let names: Vec<&str> = info.key_players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B. El Bahraoui", "Z. El-Moutaraji", "Y. Jabrane"]);

        let jabrane = &info.all_players[&36544];
        let achievement = jabrane.key_achievement.as_ref().expect("achievement");
        assert_eq!(achievement.event_type, "Goal");
        assert_eq!(achievement.detail, "Penalty");
        assert_eq!(achievement.summary, "Scored 1 goal");
        assert_eq!(jabrane.match_events[0].minute_label(), "90+3'");
        assert_eq!(jabrane.status, LineupStatus::Starting);
    }

    #[test]
    fn test_card_only_player_is_key() {
        let mut fixture = crate::testing::sample_fixture();
        fixture["events"] = json!([{
            "time": {"elapsed": 30, "extra": null},
            "team": {"id": 967, "name": "Rapide Oued ZEM"},
            "player": {"id": 152492, "name": "A. Kadi"},
            "assist": null,
            "type": "Card",
            "detail": "Yellow Card",
            "comments": null
        }]);
        let envelope = Envelope::success("fixtures", Map::new(), vec![fixture]);

        let info = extract_player_info(&envelope).expect("player info");
        assert_eq!(info.key_players.len(), 1);
        assert_eq!(
            info.key_players[0]
                .key_achievement
                .as_ref()
                .map(|a| a.summary.as_str()),
            Some("Received a yellow card")
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let envelope = sample_fixture_envelope();
        assert_eq!(extract_team_info(&envelope), extract_team_info(&envelope));
        assert_eq!(extract_player_info(&envelope), extract_player_info(&envelope));
    }

    #[test]
    fn test_empty_response_is_error_not_panic() {
        let envelope = Envelope::success("fixtures", params([("id", 1)]), Vec::new());
        assert_eq!(
            extract_team_info(&envelope),
            Err(ExtractionError::EmptyResponse)
        );
        assert_eq!(
            extract_player_info(&envelope),
            Err(ExtractionError::EmptyResponse)
        );

        let serialized = serde_json::to_value(ExtractionError::EmptyResponse).expect("serializes");
        assert_eq!(serialized, json!({"error": "No data found in response"}));
    }

    #[test]
    fn test_missing_teams_and_failed_source() {
        let envelope = Envelope::success("fixtures", Map::new(), vec![json!({"league": {}})]);
        assert_eq!(
            extract_team_info(&envelope),
            Err(ExtractionError::MissingField("teams"))
        );

        let failed = Envelope::failure("fixtures", Map::new(), vec!["HTTP 500".to_string()]);
        assert!(matches!(
            extract_player_info(&failed),
            Err(ExtractionError::FailedSource(_))
        ));
    }

    #[test]
    fn test_malformed_record() {
        let envelope = Envelope::success("fixtures", Map::new(), vec![json!("not an object")]);
        assert!(matches!(
            extract_fixture_summary(&envelope),
            Err(ExtractionError::Malformed(_))
        ));

        let wrong_types =
            Envelope::success("fixtures", Map::new(), vec![json!({"goals": {"home": "two"}})]);
        assert!(matches!(
            extract_fixture_summary(&wrong_types),
            Err(ExtractionError::Malformed(_))
        ));
    }

    #[test]
    fn test_fixture_summary() {
        let summary = extract_fixture_summary(&sample_fixture_envelope()).expect("summary");
        assert_eq!(summary.fixture_id, Some(239625));
        assert_eq!(summary.scoreline().as_deref(), Some("1-2"));
        assert_eq!(summary.halftime_away, Some(1));
        assert_eq!(summary.venue.as_deref(), Some("Stade Municipal"));
        assert_eq!(summary.status_short.as_deref(), Some("FT"));
        assert!(summary.has_result());
    }

    #[test]
    fn test_null_lists_are_tolerated() {
        let mut fixture = crate::testing::sample_fixture();
        fixture["events"] = Value::Null;
        fixture["lineups"] = Value::Null;
        let envelope = Envelope::success("fixtures", Map::new(), vec![fixture]);

        assert!(extract_events(&envelope).expect("events").is_empty());
        let info = extract_team_info(&envelope).expect("team info");
        assert!(info.home_lineup.is_none());
    }

    #[test]
    fn test_game_record_merges_sections() {
        let mut fixture = crate::testing::sample_fixture();
        let events = fixture["events"].take();
        fixture["events"] = json!([]);
        let aggregate = game_data_aggregate(fixture, events);

        let record = game_record(&aggregate);
        assert!(record.is_success());
        assert_eq!(extract_events(&record).expect("events").len(), 3);
        assert!(section_errors(&aggregate, "statistics").is_empty());
    }
}
