//! Data Collector Agent.
//!
//! Groups football API calls into named aggregates. An aggregate is itself an
//! [`Envelope`] whose `response[0]` maps each section name to the full
//! sub-envelope of one call, e.g. `{"fixture": {...}, "events": {...}}`.
//!
//! Sub-calls of one aggregate run concurrently. Every call waits for a permit
//! on the shared semaphore and is cut off after `call_timeout`, so the number
//! of requests in flight against the API stays bounded across the whole
//! pipeline.
//!
//! # Example
//!
//! ```ignore
//! use sport_scribe::agents::DataCollectorAgent;
//!
//! let collector = DataCollectorAgent::new(source, CollectorConfig::default());
//! let game = collector.collect_game_data("239625").await;
//! assert_eq!(game.get(), "game_data");
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;

use crate::football::{endpoints, params, Envelope, FootballDataSource};
use crate::utils::{format_duration, sanitize_log_input};

/// Aggregate names used as the top-level `get` of collector envelopes.
pub mod aggregates {
    pub const GAME_DATA: &str = "game_data";
    pub const TEAM_DATA: &str = "team_data";
    pub const PLAYER_DATA: &str = "player_data";
    pub const LEAGUE_DATA: &str = "league_data";
    pub const HEAD_TO_HEAD: &str = "head_to_head";
}

/// Configuration for the collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Upper bound on API calls in flight at once.
    pub max_concurrent_requests: usize,
    /// Deadline for a single API call.
    pub call_timeout: Duration,
    /// League used when a team or player statistic needs one and none is given.
    pub default_league: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            call_timeout: Duration::from_secs(60),
            default_league: 39,
        }
    }
}

impl CollectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max.max(1);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_default_league(mut self, league_id: u32) -> Self {
        self.default_league = league_id;
        self
    }
}

/// Collects football data through a [`FootballDataSource`].
pub struct DataCollectorAgent {
    source: Arc<dyn FootballDataSource>,
    limiter: Arc<Semaphore>,
    config: CollectorConfig,
}

impl std::fmt::Debug for DataCollectorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCollectorAgent")
            .field("config", &self.config)
            .field("available_permits", &self.limiter.available_permits())
            .finish_non_exhaustive()
    }
}

impl DataCollectorAgent {
    /// Agent name constant.
    pub const AGENT_NAME: &'static str = "data_collector";

    /// Creates a collector with its own request limiter.
    pub fn new(source: Arc<dyn FootballDataSource>, config: CollectorConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Self::with_limiter(source, limiter, config)
    }

    /// Creates a collector sharing an existing request limiter.
    pub fn with_limiter(
        source: Arc<dyn FootballDataSource>,
        limiter: Arc<Semaphore>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            source,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// One bounded, deadline-limited call. Never fails; problems land in the envelope.
    pub async fn fetch(&self, endpoint: &str, params: Map<String, Value>) -> Envelope {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return Envelope::failure(
                    endpoint,
                    params,
                    vec!["Request limiter closed".to_string()],
                );
            }
        };

        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, self.source.fetch(endpoint, params.clone())).await {
            Ok(envelope) => envelope,
            Err(_) => {
                let elapsed = format_duration(timeout);
                tracing::warn!(endpoint = endpoint, timeout = %elapsed, "Football API call timed out");
                Envelope::failure(
                    endpoint,
                    params,
                    vec![format!("Request failed: timed out after {}", elapsed)],
                )
            }
        }
    }

    /// Fixture, events, lineups and statistics for one game.
    pub async fn collect_game_data(&self, game_id: &str) -> Envelope {
        let game_id = game_id.trim();
        tracing::info!(game_id = %sanitize_log_input(game_id), "Collecting game data");

        let (fixture, events, lineups, statistics) = futures::join!(
            self.fetch(endpoints::FIXTURES, params([("id", game_id)])),
            self.fetch(endpoints::FIXTURE_EVENTS, params([("fixture", game_id)])),
            self.fetch(endpoints::FIXTURE_LINEUPS, params([("fixture", game_id)])),
            self.fetch(endpoints::FIXTURE_STATISTICS, params([("fixture", game_id)])),
        );

        build_aggregate(
            aggregates::GAME_DATA,
            params([("game_id", game_id)]),
            vec![
                ("fixture", fixture),
                ("events", events),
                ("lineups", lineups),
                ("statistics", statistics),
            ],
        )
    }

    /// Team profile, season statistics and season fixtures in the default league.
    pub async fn collect_team_data(&self, team_id: &str, season: u32) -> Envelope {
        self.collect_team_data_in_league(team_id, season, self.config.default_league)
            .await
    }

    /// Team profile, season statistics in `league_id`, and season fixtures.
    pub async fn collect_team_data_in_league(
        &self,
        team_id: &str,
        season: u32,
        league_id: u32,
    ) -> Envelope {
        let team_id = team_id.trim();
        tracing::info!(
            team_id = %sanitize_log_input(team_id),
            season = season,
            league_id = league_id,
            "Collecting team data"
        );

        let stats_params = params([
            ("team", Value::from(team_id)),
            ("season", Value::from(season)),
            ("league", Value::from(league_id)),
        ]);
        let fixtures_params = params([("team", Value::from(team_id)), ("season", Value::from(season))]);

        let (team_info, team_stats, fixtures) = futures::join!(
            self.fetch(endpoints::TEAMS, params([("id", team_id)])),
            self.fetch(endpoints::TEAM_STATISTICS, stats_params),
            self.fetch(endpoints::FIXTURES, fixtures_params),
        );

        build_aggregate(
            aggregates::TEAM_DATA,
            params([("team_id", Value::from(team_id)), ("season", Value::from(season))]),
            vec![
                ("team_info", team_info),
                ("team_stats", team_stats),
                ("fixtures", fixtures),
            ],
        )
    }

    /// Player profile, season statistics and transfer history.
    pub async fn collect_player_data(&self, player_id: &str, season: u32) -> Envelope {
        let player_id = player_id.trim();
        tracing::info!(
            player_id = %sanitize_log_input(player_id),
            season = season,
            "Collecting player data"
        );

        let info_params = params([("id", Value::from(player_id)), ("season", Value::from(season))]);
        let stats_params = params([
            ("id", Value::from(player_id)),
            ("season", Value::from(season)),
            ("league", Value::from(self.config.default_league)),
        ]);

        let (player_info, player_stats, transfers) = futures::join!(
            self.fetch(endpoints::PLAYERS, info_params),
            self.fetch(endpoints::PLAYERS, stats_params),
            self.fetch(endpoints::TRANSFERS, params([("player", player_id)])),
        );

        build_aggregate(
            aggregates::PLAYER_DATA,
            params([("player_id", Value::from(player_id)), ("season", Value::from(season))]),
            vec![
                ("player_info", player_info),
                ("player_stats", player_stats),
                ("transfers", transfers),
            ],
        )
    }

    /// League table and season fixtures.
    pub async fn collect_league_data(&self, league_id: u32, season: u32) -> Envelope {
        tracing::info!(league_id = league_id, season = season, "Collecting league data");

        let league_params = params([("league", league_id), ("season", season)]);
        let (standings, fixtures) = futures::join!(
            self.fetch(endpoints::STANDINGS, league_params.clone()),
            self.fetch(endpoints::FIXTURES, league_params.clone()),
        );

        build_aggregate(
            aggregates::LEAGUE_DATA,
            league_params,
            vec![("standings", standings), ("fixtures", fixtures)],
        )
    }

    /// Last `last` meetings between two teams.
    pub async fn collect_head_to_head(&self, home_id: u64, away_id: u64, last: u32) -> Envelope {
        tracing::info!(home_id = home_id, away_id = away_id, last = last, "Collecting head-to-head");

        let h2h_params = params([
            ("h2h", Value::from(format!("{}-{}", home_id, away_id))),
            ("last", Value::from(last)),
        ]);
        let envelope = self.fetch(endpoints::HEAD_TO_HEAD, h2h_params.clone()).await;

        if envelope.is_success() {
            Envelope::success(aggregates::HEAD_TO_HEAD, h2h_params, envelope.into_response())
        } else {
            Envelope::failure(aggregates::HEAD_TO_HEAD, h2h_params, envelope.errors().to_vec())
        }
    }

    /// Fixtures of one league on one day. The season is the date's year.
    pub async fn find_fixtures(&self, league_id: u32, date: NaiveDate) -> Envelope {
        let fixture_params = params([
            ("league", Value::from(league_id)),
            ("season", Value::from(date.year())),
            ("date", Value::from(date.format("%Y-%m-%d").to_string())),
        ]);
        tracing::info!(league_id = league_id, date = %date, "Finding fixtures");
        self.fetch(endpoints::FIXTURES, fixture_params).await
    }
}

/// Folds named sub-envelopes into one aggregate envelope.
///
/// Succeeds with one record when at least one section succeeded; failed
/// sections stay embedded with their errors. When every section failed the
/// aggregate is a failure whose errors are prefixed by section name.
pub fn build_aggregate(
    get: &str,
    parameters: Map<String, Value>,
    sections: Vec<(&str, Envelope)>,
) -> Envelope {
    let all_failed = sections.iter().all(|(_, envelope)| !envelope.is_success());

    if all_failed {
        let errors = sections
            .iter()
            .flat_map(|(name, envelope)| {
                envelope
                    .errors()
                    .iter()
                    .map(move |error| format!("{}: {}", name, error))
            })
            .collect();
        tracing::warn!(aggregate = get, "Every section of the aggregate failed");
        return Envelope::failure(get, parameters, errors);
    }

    let mut record = Map::new();
    for (name, envelope) in sections {
        if !envelope.is_success() {
            tracing::debug!(
                aggregate = get,
                section = name,
                errors = ?envelope.errors(),
                "Aggregate section failed"
            );
        }
        // Envelope serialization cannot fail: every field is plain data.
        let value = serde_json::to_value(&envelope).unwrap_or(Value::Null);
        record.insert(name.to_string(), value);
    }

    Envelope::success(get, parameters, vec![Value::Object(record)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::extract::{section_errors, section_items};
    use crate::testing::{sample_fixture, FakeDataSource};
    use serde_json::json;

    fn collector(source: FakeDataSource) -> (Arc<FakeDataSource>, DataCollectorAgent) {
        let source = Arc::new(source);
        let agent = DataCollectorAgent::new(source.clone(), CollectorConfig::default());
        (source, agent)
    }

    #[tokio::test]
    async fn test_collect_game_data_sections() {
        let fixture = sample_fixture();
        let events = fixture["events"].clone();
        let source = FakeDataSource::new()
            .with_response(endpoints::FIXTURES, vec![fixture])
            .with_response(endpoints::FIXTURE_EVENTS, events.as_array().cloned().unwrap_or_default())
            .with_response(endpoints::FIXTURE_LINEUPS, vec![])
            .with_failure(endpoints::FIXTURE_STATISTICS, "HTTP 500");
        let (source, agent) = collector(source);

        let game = agent.collect_game_data(" 239625 ").await;

        assert!(game.is_success());
        assert_eq!(game.get(), "game_data");
        assert_eq!(game.results(), 1);
        assert_eq!(section_items(&game, "fixture").len(), 1);
        assert_eq!(section_items(&game, "events").len(), 3);
        assert_eq!(section_errors(&game, "statistics"), vec!["HTTP 500".to_string()]);
        assert_eq!(source.call_count(), 4);
        assert_eq!(
            source.calls_for(endpoints::FIXTURES)[0].get("id"),
            Some(&json!("239625"))
        );
    }

    #[tokio::test]
    async fn test_all_sections_failed_is_failure() {
        let source = FakeDataSource::new()
            .with_failure(endpoints::FIXTURES, "HTTP 500")
            .with_failure(endpoints::FIXTURE_EVENTS, "HTTP 500")
            .with_failure(endpoints::FIXTURE_LINEUPS, "HTTP 500")
            .with_failure(endpoints::FIXTURE_STATISTICS, "HTTP 500");
        let (_, agent) = collector(source);

        let game = agent.collect_game_data("1").await;

        assert!(!game.is_success());
        assert_eq!(game.results(), 0);
        assert!(game.response().is_empty());
        assert_eq!(game.errors().len(), 4);
        assert_eq!(game.errors()[0], "fixture: HTTP 500");
    }

    #[tokio::test]
    async fn test_team_data_uses_league_and_season() {
        let source = FakeDataSource::new()
            .with_response(endpoints::TEAMS, vec![json!({"team": {"id": 968}})])
            .with_response(endpoints::TEAM_STATISTICS, vec![])
            .with_response(endpoints::FIXTURES, vec![]);
        let (source, agent) = collector(source);

        let team = agent.collect_team_data_in_league("968", 2019, 200).await;

        assert!(team.is_success());
        assert_eq!(team.get(), "team_data");
        let stats_call = &source.calls_for(endpoints::TEAM_STATISTICS)[0];
        assert_eq!(stats_call.get("league"), Some(&json!(200)));
        assert_eq!(stats_call.get("season"), Some(&json!(2019)));
    }

    #[tokio::test]
    async fn test_player_and_league_aggregates() {
        let source = FakeDataSource::new()
            .with_response(endpoints::PLAYERS, vec![json!({"player": {"id": 276}})])
            .with_failure(endpoints::TRANSFERS, "HTTP 429")
            .with_response(endpoints::STANDINGS, vec![])
            .with_response(endpoints::FIXTURES, vec![]);
        let (_, agent) = collector(source);

        let player = agent.collect_player_data("276", 2024).await;
        assert!(player.is_success());
        assert_eq!(section_items(&player, "player_info").len(), 1);
        assert_eq!(section_errors(&player, "transfers"), vec!["HTTP 429".to_string()]);

        let league = agent.collect_league_data(39, 2024).await;
        assert_eq!(league.get(), "league_data");
        assert!(league.is_success());
    }

    #[tokio::test]
    async fn test_head_to_head_and_find_fixtures_params() {
        let source = FakeDataSource::new()
            .with_response(endpoints::HEAD_TO_HEAD, vec![json!({}), json!({})])
            .with_response(endpoints::FIXTURES, vec![]);
        let (source, agent) = collector(source);

        let h2h = agent.collect_head_to_head(967, 968, 10).await;
        assert_eq!(h2h.get(), "head_to_head");
        assert_eq!(h2h.results(), 2);
        assert_eq!(
            source.calls_for(endpoints::HEAD_TO_HEAD)[0].get("h2h"),
            Some(&json!("967-968"))
        );

        let date = NaiveDate::from_ymd_opt(2024, 5, 19).expect("valid date");
        agent.find_fixtures(39, date).await;
        let call = &source.calls_for(endpoints::FIXTURES)[0];
        assert_eq!(call.get("date"), Some(&json!("2024-05-19")));
        assert_eq!(call.get("season"), Some(&json!(2024)));
    }

    #[tokio::test]
    async fn test_call_timeout_becomes_failure() {
        let source = FakeDataSource::new()
            .with_response(endpoints::FIXTURES, vec![sample_fixture()])
            .with_delay(Duration::from_millis(200));
        let source = Arc::new(source);
        let agent = DataCollectorAgent::new(
            source,
            CollectorConfig::default().with_call_timeout(Duration::from_millis(20)),
        );

        let envelope = agent.fetch(endpoints::FIXTURES, params([("id", "1")])).await;
        assert!(!envelope.is_success());
        assert_eq!(envelope.errors(), ["Request failed: timed out after 20 ms"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let source = FakeDataSource::new()
            .with_response(endpoints::FIXTURES, vec![])
            .with_response(endpoints::FIXTURE_EVENTS, vec![])
            .with_response(endpoints::FIXTURE_LINEUPS, vec![])
            .with_response(endpoints::FIXTURE_STATISTICS, vec![])
            .with_delay(Duration::from_millis(20));
        let source = Arc::new(source);
        let agent = DataCollectorAgent::new(
            source.clone(),
            CollectorConfig::default().with_max_concurrent_requests(2),
        );

        agent.collect_game_data("1").await;

        assert_eq!(source.call_count(), 4);
        assert!(source.max_in_flight() <= 2);
    }

    #[test]
    fn test_build_aggregate_partial_success() {
        let ok = Envelope::success("fixtures", Map::new(), vec![json!({"fixture": {"id": 1}})]);
        let failed = Envelope::failure("fixtures/events", Map::new(), vec!["HTTP 500".into()]);

        let aggregate = build_aggregate("game_data", Map::new(), vec![("fixture", ok), ("events", failed)]);

        assert!(aggregate.is_success());
        assert_eq!(aggregate.results(), 1);
        let record = aggregate.first().expect("record");
        assert_eq!(record["events"]["errors"][0], "HTTP 500");
        assert_eq!(record["fixture"]["results"], 1);
    }
}
