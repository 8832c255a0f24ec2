//! Shapes extracted data and research into the writer's input.
//!
//! The writer sees plain text lines, not JSON. Facts of the current match
//! go into `data_summary`; everything historical goes into
//! `research_context`, so the prompt can rank them differently.

use serde::Serialize;

use super::extract::{FixtureSummary, MatchEvent, PlayerInfo};
use super::researcher::{PlayerPerformance, ResearchContext, TeamForm};
use super::types::{ArticleRequest, ArticleType};

/// Everything the writer needs for one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriterInput {
    pub article_type: ArticleType,
    /// What the article is about, e.g. `"Rapide Oued ZEM vs Wydad AC"`.
    pub subject: String,
    pub data_summary: String,
    pub research_context: Vec<String>,
    pub storylines: Vec<String>,
    pub target_length: Option<u32>,
    pub tone: Option<String>,
}

impl WriterInput {
    /// Applies the caller's length and tone preferences.
    pub fn with_request(mut self, request: &ArticleRequest) -> Self {
        self.target_length = request.target_length;
        self.tone = request.tone.clone();
        self
    }
}

/// `19' Z. El-Moutaraji (Wydad AC)`, with the goal detail when it is not a plain goal.
fn goal_line(event: &MatchEvent) -> String {
    let detail = match event.detail.as_str() {
        "Normal Goal" | "" => String::new(),
        other => format!(", {}", other.to_lowercase()),
    };
    format!("{} {} ({}{})", event.minute_label(), event.player, event.team, detail)
}

/// Current-match fact lines for a fixture.
pub fn fixture_data_lines(
    summary: &FixtureSummary,
    events: &[MatchEvent],
    players: Option<&PlayerInfo>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Match: {} vs {}",
        summary.home_team.name, summary.away_team.name
    )];

    let mut competition = summary.league.name.clone();
    if let Some(round) = &summary.league.round {
        competition.push_str(&format!(" ({})", round));
    }
    lines.push(format!("Competition: {}", competition));

    if let (Some(home), Some(away)) = (summary.home_goals, summary.away_goals) {
        lines.push(format!("Score: {} - {}", home, away));
    }
    if let (Some(home), Some(away)) = (summary.halftime_home, summary.halftime_away) {
        lines.push(format!("Half-time: {} - {}", home, away));
    }
    if let Some(date) = &summary.date {
        lines.push(format!("Date: {}", date));
    }
    match (&summary.venue, &summary.city) {
        (Some(venue), Some(city)) => lines.push(format!("Venue: {}, {}", venue, city)),
        (Some(venue), None) => lines.push(format!("Venue: {}", venue)),
        _ => {}
    }
    if let Some(status) = &summary.status {
        lines.push(format!("Status: {}", status));
    }
    if let Some(referee) = &summary.referee {
        lines.push(format!("Referee: {}", referee));
    }

    let goals: Vec<String> = events
        .iter()
        .filter(|e| e.is_goal() && e.detail != "Missed Penalty")
        .map(goal_line)
        .collect();
    if !goals.is_empty() {
        lines.push(format!("Goals: {}", goals.join("; ")));
    }

    let red_cards: Vec<String> = events
        .iter()
        .filter(|e| e.is_card() && e.detail.contains("Red"))
        .map(|e| format!("{} {} ({})", e.minute_label(), e.player, e.team))
        .collect();
    if !red_cards.is_empty() {
        lines.push(format!("Red cards: {}", red_cards.join("; ")));
    }

    if let Some(players) = players {
        let key: Vec<String> = players
            .key_players
            .iter()
            .filter_map(|p| {
                p.key_achievement
                    .as_ref()
                    .map(|a| format!("{} ({}): {}", p.name, p.team, a.summary))
            })
            .collect();
        if !key.is_empty() {
            lines.push(format!("Key players: {}", key.join("; ")));
        }
    }

    lines
}

/// Season fact lines for a player.
pub fn player_data_lines(performance: &PlayerPerformance) -> Vec<String> {
    let mut lines = vec![format!("Player: {}", performance.name)];
    if let Some(team) = &performance.team {
        lines.push(format!("Team: {}", team));
    }
    if let Some(position) = &performance.position {
        lines.push(format!("Position: {}", position));
    }
    if let Some(age) = performance.age {
        lines.push(format!("Age: {}", age));
    }
    if let Some(nationality) = &performance.nationality {
        lines.push(format!("Nationality: {}", nationality));
    }
    lines.push(format!(
        "Season: {} appearances, {} minutes, {} goals, {} assists",
        performance.appearances, performance.minutes, performance.goals, performance.assists
    ));
    if performance.yellow_cards > 0 || performance.red_cards > 0 {
        lines.push(format!(
            "Discipline: {} yellow, {} red",
            performance.yellow_cards, performance.red_cards
        ));
    }
    if let Some(rating) = performance.rating {
        lines.push(format!("Average rating: {:.2}", rating));
    }
    lines
}

fn form_line(form: &TeamForm) -> String {
    let mut line = format!("{} season", form.name);
    if let (Some(w), Some(d), Some(l)) = (form.wins, form.draws, form.losses) {
        line.push_str(&format!(": {}W {}D {}L", w, d, l));
    }
    if let (Some(scored), Some(conceded)) = (form.goals_for, form.goals_against) {
        line.push_str(&format!(", goals {}-{}", scored, conceded));
    }
    if let Some(recent) = &form.form {
        line.push_str(&format!(", recent form {}", recent));
    }
    line
}

/// Background lines from research.
pub fn research_lines(context: &ResearchContext) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(h2h) = &context.head_to_head {
        lines.push(h2h.describe());
        lines.push(format!(
            "Head-to-head goals: {}-{}, {:.1} per game; recent results {}",
            h2h.goals_for,
            h2h.goals_against,
            h2h.average_goals(),
            h2h.recent_results.join("")
        ));
    }

    if let Some(standings) = &context.standings {
        let league = standings.league.as_deref().unwrap_or("League");
        let top: Vec<String> = standings
            .top
            .iter()
            .map(|row| format!("{}. {} ({} pts)", row.rank, row.team, row.points))
            .collect();
        lines.push(format!("{} top three: {}", league, top.join(", ")));
        let bottom: Vec<String> = standings.bottom.iter().map(|row| row.team.clone()).collect();
        lines.push(format!("{} bottom three: {}", league, bottom.join(", ")));
        if let Some(average) = standings.average_goals_per_game {
            lines.push(format!("{} average goals per game: {:.2}", league, average));
        }
    }

    for form in [&context.home_form, &context.away_form].into_iter().flatten() {
        lines.push(form_line(form));
    }

    if let Some(player) = &context.player {
        lines.push(format!(
            "{} season: {} goals, {} assists in {} appearances",
            player.name, player.goals, player.assists, player.appearances
        ));
    }

    lines
}

/// Writer input for a game recap or preview.
pub fn game_writer_input(
    article_type: ArticleType,
    summary: &FixtureSummary,
    events: &[MatchEvent],
    players: Option<&PlayerInfo>,
    research: &ResearchContext,
    storylines: Vec<String>,
) -> WriterInput {
    WriterInput {
        article_type,
        subject: format!("{} vs {}", summary.home_team.name, summary.away_team.name),
        data_summary: fixture_data_lines(summary, events, players).join("\n"),
        research_context: research_lines(research),
        storylines,
        target_length: None,
        tone: None,
    }
}

/// Writer input for a player spotlight, optionally around one game.
pub fn player_writer_input(
    performance: &PlayerPerformance,
    fixture: Option<(&FixtureSummary, &[MatchEvent])>,
    research: &ResearchContext,
    storylines: Vec<String>,
) -> WriterInput {
    let mut lines = player_data_lines(performance);
    if let Some((summary, events)) = fixture {
        lines.extend(fixture_data_lines(summary, events, None));
        let own_events: Vec<String> = events
            .iter()
            .filter(|e| e.player_id.is_some() && e.player_id == performance.player_id)
            .map(|e| format!("{} {} ({})", e.minute_label(), e.event_type, e.detail))
            .collect();
        if !own_events.is_empty() {
            lines.push(format!("{} in this match: {}", performance.name, own_events.join("; ")));
        }
    }

    WriterInput {
        article_type: ArticleType::PlayerSpotlight,
        subject: performance.name.clone(),
        data_summary: lines.join("\n"),
        research_context: research_lines(research),
        storylines,
        target_length: None,
        tone: None,
    }
}
