//! Article pipeline orchestrator.
//!
//! Chains the agents through `Collect -> Extract -> Enrich -> Research ->
//! Format -> Write -> Edit` and assembles the article metadata. Each stage
//! returns an [`AgentResult`]; a stage error ends the run. Enrichment and
//! delegated storylines are best-effort: their failures are recorded as
//! degradations on the article instead of failing it.
//!
//! Progress is reported as [`PipelineEvent`]s on an optional channel and
//! as `tracing` spans, one per stage.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use crate::agents::collector::DataCollectorAgent;
use crate::agents::editor::{EditorAgent, ReviewContext};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::extract::{
    extract_events, extract_fixture_summary, extract_player_info, game_record, section_errors,
    section_items, FixtureSummary, MatchEvent, PlayerInfo,
};
use crate::agents::format::{game_writer_input, player_writer_input, WriterInput};
use crate::agents::researcher::{
    analyze_head_to_head, analyze_standings, generate_storylines, summarize_player_performance,
    summarize_team_data, PlayerPerformance, ResearchAgent, ResearchContext, StorylineOutcome,
};
use crate::agents::types::{
    ArticleMetadata, ArticleRequest, ArticleResult, ArticleType, Degradation, PipelineEvent,
    PipelineStage,
};
use crate::agents::writer::{extract_headline, fallback_article, WritingAgent};
use crate::football::{article_slug, ApiFootballClient, Envelope, FootballDataSource};
use crate::llm::{LlmProvider, OpenAiCompatibleClient};
use crate::metrics::MetricsCollector;
use crate::utils::{format_duration, sanitize_log_input, word_count};

use super::config::ScribeConfig;

/// Version stamped into every article's metadata.
pub const PIPELINE_VERSION: &str = "1.0.0";

/// Model name recorded when the template article replaces the model's.
pub const FALLBACK_MODEL: &str = "template";

/// Key players whose season data is fetched for a game article.
const KEY_PLAYER_SAMPLE: usize = 2;

/// Head-to-head meetings fetched for a game article.
const HEAD_TO_HEAD_MEETINGS: u32 = 10;

/// Readiness report for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub ready: bool,
    pub version: String,
    pub model: String,
    /// Agent name to state, e.g. `"writer" -> "ready"`.
    pub agents: BTreeMap<String, String>,
}

/// Optional event channel. Send errors are ignored; the receiver may be gone.
#[derive(Clone, Default)]
struct EventSink(Option<mpsc::Sender<PipelineEvent>>);

impl EventSink {
    /// Never waits: events that do not fit in the channel are dropped.
    fn send(&self, event: PipelineEvent) {
        if let Some(tx) = &self.0 {
            if let Err(mpsc::error::TrySendError::Full(event)) = tx.try_send(event) {
                tracing::debug!(event = ?event, "Event channel full, dropping pipeline event");
            }
        }
    }
}

/// Mutable state of one run.
struct Run {
    sink: EventSink,
    metrics: MetricsCollector,
    degradations: Vec<Degradation>,
    data_sources: Vec<String>,
}

impl Run {
    fn new(sink: EventSink) -> Self {
        Self {
            sink,
            metrics: MetricsCollector::new(),
            degradations: Vec::new(),
            data_sources: Vec::new(),
        }
    }

    async fn degrade(&mut self, stage: PipelineStage, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(stage = %stage, reason = %reason, "Stage degraded");
        self.metrics.record_degradation(stage.as_str());
        self.sink
            .send(PipelineEvent::stage_degraded(stage, reason.clone()));
        self.degradations.push(Degradation::new(stage, reason));
    }

    fn record_source(&mut self, envelope: &Envelope) {
        let source = format!("api-football:{}", envelope.get());
        if !self.data_sources.contains(&source) {
            self.data_sources.push(source);
        }
    }

    /// Keeps a successful enrichment envelope; records a degradation otherwise.
    async fn accept(&mut self, label: &str, envelope: Envelope) -> Option<Envelope> {
        if envelope.is_success() {
            self.record_source(&envelope);
            Some(envelope)
        } else {
            self.degrade(
                PipelineStage::Enrich,
                format!("{}: {}", label, envelope.errors().join("; ")),
            )
            .await;
            None
        }
    }
}

/// Extracted facts of one game.
struct GameFacts {
    summary: FixtureSummary,
    events: Vec<MatchEvent>,
    players: Option<PlayerInfo>,
}

/// Supplementary data fetched around the base record.
#[derive(Default)]
struct Enrichment {
    head_to_head: Option<Envelope>,
    league: Option<Envelope>,
    home_team: Option<Envelope>,
    away_team: Option<Envelope>,
    players: Vec<Envelope>,
}

impl Enrichment {
    fn count(&self) -> usize {
        [&self.head_to_head, &self.league, &self.home_team, &self.away_team]
            .into_iter()
            .flatten()
            .count()
            + self.players.len()
    }

    /// Envelopes for rule-based storylines, most relevant first.
    fn context(&self) -> Vec<Envelope> {
        [&self.head_to_head, &self.league, &self.home_team, &self.away_team]
            .into_iter()
            .flatten()
            .chain(self.players.iter())
            .cloned()
            .collect()
    }
}

/// Writer input plus what the editor needs to review the result.
struct Draft {
    input: WriterInput,
    review: ReviewContext,
}

/// The article pipeline.
///
/// Holds read-only configuration and shared client handles, so one
/// instance serves concurrent requests behind an `Arc`.
pub struct ArticlePipeline {
    config: ScribeConfig,
    collector: DataCollectorAgent,
    researcher: ResearchAgent,
    writer: WritingAgent,
    editor: EditorAgent,
    metrics: MetricsCollector,
    events: EventSink,
}

impl std::fmt::Debug for ArticlePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticlePipeline")
            .field("config", &self.config)
            .field("collector", &self.collector)
            .field("researcher", &self.researcher)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

impl ArticlePipeline {
    /// Creates a pipeline over the given data source and model provider.
    pub fn new(
        config: ScribeConfig,
        data_source: Arc<dyn FootballDataSource>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            collector: DataCollectorAgent::new(data_source, config.collector_config()),
            researcher: ResearchAgent::new(Arc::clone(&llm), config.researcher_config()),
            writer: WritingAgent::new(llm, config.writer_config()),
            editor: EditorAgent::new(),
            metrics: MetricsCollector::new(),
            events: EventSink::default(),
            config,
        }
    }

    /// Creates a pipeline with the HTTP clients described by `config`.
    ///
    /// # Errors
    ///
    /// `Configuration` when the configuration is invalid or a client cannot
    /// be built (for example an empty API key).
    pub fn from_config(config: ScribeConfig) -> AgentResult<Self> {
        config
            .validate()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        let data_source = ApiFootballClient::new(
            config.football_base_url.clone(),
            config.rapidapi_key.clone(),
            config.call_timeout,
        )
        .map_err(|e| AgentError::Configuration(e.to_string()))?;

        let llm = OpenAiCompatibleClient::new(
            config.llm_api_base.clone(),
            config.llm_api_key.clone(),
            config.model.clone(),
            config.call_timeout,
        )
        .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Ok(Self::new(config, Arc::new(data_source), Arc::new(llm)))
    }

    /// Sends [`PipelineEvent`]s of every run to `tx`.
    ///
    /// Events are offered with `try_send`; when the receiver falls behind
    /// and the channel is full, further events are dropped rather than
    /// stalling generation.
    pub fn with_event_sender(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = EventSink(Some(tx));
        self
    }

    pub fn config(&self) -> &ScribeConfig {
        &self.config
    }

    /// The collector, for callers that need raw data such as fixture lookups.
    pub fn collector(&self) -> &DataCollectorAgent {
        &self.collector
    }

    pub async fn generate_game_recap(&self, game_id: &str) -> AgentResult<ArticleResult> {
        self.generate(ArticleRequest::game_recap(game_id)).await
    }

    pub async fn generate_preview_article(&self, game_id: &str) -> AgentResult<ArticleResult> {
        self.generate(ArticleRequest::preview(game_id)).await
    }

    pub async fn generate_player_spotlight(
        &self,
        player_id: &str,
        game_id: Option<&str>,
    ) -> AgentResult<ArticleResult> {
        self.generate(ArticleRequest::player_spotlight(
            player_id,
            game_id.map(str::to_string),
        ))
        .await
    }

    /// Readiness of the pipeline and its agents.
    pub fn status(&self) -> PipelineStatus {
        let agents = [
            DataCollectorAgent::AGENT_NAME,
            ResearchAgent::AGENT_NAME,
            WritingAgent::AGENT_NAME,
            EditorAgent::AGENT_NAME,
        ]
        .into_iter()
        .map(|name| (name.to_string(), "ready".to_string()))
        .collect();

        PipelineStatus {
            ready: true,
            version: PIPELINE_VERSION.to_string(),
            model: self.writer.model_name().to_string(),
            agents,
        }
    }

    /// Runs the pipeline for one request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a blank or non-numeric id
    /// - `UpstreamUnavailable` when the base record could not be fetched
    /// - `GameNotFound` when the API knows no such game or player
    /// - `MalformedUpstreamData` when the base record cannot be read
    /// - `GenerationFailed` when the writer fails and no fallback is allowed
    /// - `ValidationFailed` when the article breaks the length or section contract
    pub async fn generate(&self, request: ArticleRequest) -> AgentResult<ArticleResult> {
        let started = Instant::now();
        let article_type = request.article_type;
        let span = tracing::info_span!("article_pipeline", article_type = %article_type);

        let result = self
            .run(request, started)
            .instrument(span)
            .await;
        let elapsed = started.elapsed();

        match &result {
            Ok(article) => {
                self.metrics
                    .record_article("success", article_type.as_str(), elapsed.as_secs_f64());
                tracing::info!(
                    article_id = %article.article_id(),
                    words = article.metadata.word_count,
                    degradations = article.metadata.degradations.len(),
                    duration_ms = article.metadata.pipeline_duration_ms,
                    "Article generated"
                );
                self.events
                    .send(PipelineEvent::pipeline_completed(
                        article.article_id(),
                        article.metadata.pipeline_duration_ms,
                    ));
            }
            Err(e) => {
                self.metrics
                    .record_article("failure", article_type.as_str(), elapsed.as_secs_f64());
                tracing::warn!(error = %e, kind = e.kind(), "Article pipeline failed");
                self.events
                    .send(PipelineEvent::pipeline_failed(e.to_string()));
            }
        }

        result
    }

    async fn run(&self, request: ArticleRequest, started: Instant) -> AgentResult<ArticleResult> {
        validate_request(&request)?;
        let mut run = Run::new(self.events.clone());

        let draft = match request.article_type {
            ArticleType::GameRecap | ArticleType::Preview => {
                let game_id = request.game_id.as_deref().unwrap_or_default().trim();
                self.draft_game_article(&mut run, request.article_type, game_id)
                    .await?
            }
            ArticleType::PlayerSpotlight => {
                let player_id = request.player_id.as_deref().unwrap_or_default().trim();
                let game_id = request
                    .game_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty());
                self.draft_player_spotlight(&mut run, player_id, game_id)
                    .await?
            }
        };
        let input = draft.input.with_request(&request);

        // Write
        let sink = run.sink.clone();
        let (content, model_used) = self
            .stage(
                &sink,
                PipelineStage::Write,
                self.write(&mut run, request.article_type, &input),
                |(content, model)| format!("{} words from {}", word_count(content), model),
            )
            .await?;

        // Edit
        let (content, feedback) = self
            .stage(
                &sink,
                PipelineStage::Edit,
                async { Ok(self.editor.review_article(&content, &draft.review)) },
                |(_, feedback)| {
                    if feedback.approved {
                        "approved".to_string()
                    } else {
                        "approved with notes".to_string()
                    }
                },
            )
            .await?;

        let generated_at = Utc::now();
        let headline = extract_headline(&content);
        let slug = article_slug(headline.as_deref().unwrap_or(&input.subject), generated_at);

        let metadata = ArticleMetadata {
            article_id: Uuid::new_v4(),
            article_type: request.article_type,
            game_id: request.game_id.clone(),
            player_id: request.player_id.clone(),
            headline,
            slug: Some(slug),
            storylines: input.storylines.clone(),
            generated_at,
            pipeline_duration_ms: started.elapsed().as_millis() as u64,
            data_sources: run.data_sources,
            model_used,
            word_count: word_count(&content),
            review_feedback: Some(feedback),
            degradations: run.degradations,
            pipeline_version: PIPELINE_VERSION.to_string(),
        };

        Ok(ArticleResult { content, metadata })
    }

    /// Runs one stage: events, span, and failure metrics around `fut`.
    async fn stage<T, F, S>(
        &self,
        sink: &EventSink,
        stage: PipelineStage,
        fut: F,
        summarize: S,
    ) -> AgentResult<T>
    where
        F: Future<Output = AgentResult<T>>,
        S: FnOnce(&T) -> String,
    {
        sink.send(PipelineEvent::stage_started(stage));
        let span = tracing::info_span!("stage", stage = %stage);
        let result = fut.instrument(span).await;

        match &result {
            Ok(value) => {
                let summary = summarize(value);
                tracing::debug!(stage = %stage, summary = %summary, "Stage completed");
                sink.send(PipelineEvent::stage_completed(stage, summary));
            }
            Err(e) => {
                self.metrics.record_stage_failure(stage.as_str());
                sink.send(PipelineEvent::stage_failed(stage, e.to_string()));
            }
        }
        result
    }

    // ------------------------------------------------------------------------
    // Game recap and preview
    // ------------------------------------------------------------------------

    async fn draft_game_article(
        &self,
        run: &mut Run,
        article_type: ArticleType,
        game_id: &str,
    ) -> AgentResult<Draft> {
        let sink = run.sink.clone();

        let game_data = self
            .stage(&sink, PipelineStage::Collect, self.collect_game(game_id), |_| {
                format!("game {}", game_id)
            })
            .await?;
        run.record_source(&game_data);

        let facts = self
            .stage(
                &sink,
                PipelineStage::Extract,
                async { extract_game_facts(&game_data) },
                |facts| {
                    format!(
                        "{} vs {}, {} events",
                        facts.summary.home_team.name,
                        facts.summary.away_team.name,
                        facts.events.len()
                    )
                },
            )
            .await?;
        if article_type == ArticleType::GameRecap && !facts.summary.has_result() {
            tracing::warn!(game_id = game_id, "Recap requested for a game without a final score");
        }

        let enrichment = self
            .stage(
                &sink,
                PipelineStage::Enrich,
                self.enrich_game(run, &facts),
                |e| format!("{} supplementary sources", e.count()),
            )
            .await?;

        let context = enrichment.context();
        let (outcome, research) = self
            .stage(
                &sink,
                PipelineStage::Research,
                async {
                    let outcome = self.storylines(Some(&game_data), &context).await;
                    let research = ResearchContext {
                        head_to_head: enrichment.head_to_head.as_ref().and_then(|h2h| {
                            facts
                                .summary
                                .home_team
                                .id
                                .and_then(|id| analyze_head_to_head(h2h, id))
                        }),
                        standings: enrichment.league.as_ref().and_then(analyze_standings),
                        home_form: enrichment.home_team.as_ref().and_then(summarize_team_data),
                        away_form: enrichment.away_team.as_ref().and_then(summarize_team_data),
                        player: None,
                    };
                    Ok((outcome, research))
                },
                |(outcome, _)| format!("{} storylines", outcome.storylines.len()),
            )
            .await?;
        if let Some(reason) = outcome.fallback_reason {
            run.degrade(
                PipelineStage::Research,
                format!("rule-based storylines used: {}", reason),
            )
            .await;
        }

        let input = self
            .stage(
                &sink,
                PipelineStage::Format,
                async {
                    Ok(game_writer_input(
                        article_type,
                        &facts.summary,
                        &facts.events,
                        facts.players.as_ref(),
                        &research,
                        outcome.storylines,
                    ))
                },
                |input| format!("{} data lines", input.data_summary.lines().count()),
            )
            .await?;

        Ok(Draft {
            input,
            review: ReviewContext {
                article_type: Some(article_type),
                fixture: Some(facts.summary),
            },
        })
    }

    /// Game data with a usable fixture record.
    async fn collect_game(&self, game_id: &str) -> AgentResult<Envelope> {
        let game_data = self.collector.collect_game_data(game_id).await;
        if !game_data.is_success() {
            return Err(AgentError::UpstreamUnavailable(format!(
                "game {}: {}",
                game_id,
                game_data.errors().join("; ")
            )));
        }

        if section_items(&game_data, "fixture").is_empty() {
            let errors = section_errors(&game_data, "fixture");
            return Err(if errors.is_empty() {
                AgentError::GameNotFound(format!("no fixture with id {}", game_id))
            } else {
                AgentError::UpstreamUnavailable(format!("fixture: {}", errors.join("; ")))
            });
        }

        Ok(game_data)
    }

    /// Team form, head-to-head, league table and key players, fetched concurrently.
    async fn enrich_game(&self, run: &mut Run, facts: &GameFacts) -> AgentResult<Enrichment> {
        let summary = &facts.summary;
        let season = summary.league.season.unwrap_or(self.config.default_season);
        let league_id = summary
            .league
            .id
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or(self.config.default_league);

        let home_id = summary.home_team.id.map(|id| id.to_string());
        let away_id = summary.away_team.id.map(|id| id.to_string());
        let player_ids: Vec<String> = facts
            .players
            .as_ref()
            .map(|players| {
                players
                    .key_players
                    .iter()
                    .take(KEY_PLAYER_SAMPLE)
                    .map(|p| p.id.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let team_data = move |team_id: Option<String>| async move {
            match team_id {
                Some(id) => Some(
                    self.collector
                        .collect_team_data_in_league(&id, season, league_id)
                        .await,
                ),
                None => None,
            }
        };
        let head_to_head = async {
            match (summary.home_team.id, summary.away_team.id) {
                (Some(home), Some(away)) => Some(
                    self.collector
                        .collect_head_to_head(home, away, HEAD_TO_HEAD_MEETINGS)
                        .await,
                ),
                _ => None,
            }
        };

        let (home_team, away_team, head_to_head, league, players) = futures::join!(
            team_data(home_id),
            team_data(away_id),
            head_to_head,
            self.collector.collect_league_data(league_id, season),
            futures::future::join_all(
                player_ids
                    .iter()
                    .map(|id| self.collector.collect_player_data(id, season))
            ),
        );

        let mut enrichment = Enrichment::default();
        match home_team {
            Some(envelope) => enrichment.home_team = run.accept("home team data", envelope).await,
            None => run.degrade(PipelineStage::Enrich, "home team id missing").await,
        }
        match away_team {
            Some(envelope) => enrichment.away_team = run.accept("away team data", envelope).await,
            None => run.degrade(PipelineStage::Enrich, "away team id missing").await,
        }
        if let Some(envelope) = head_to_head {
            enrichment.head_to_head = run.accept("head-to-head", envelope).await;
        }
        enrichment.league = run.accept("league data", league).await;
        for (id, envelope) in player_ids.iter().zip(players) {
            if let Some(envelope) = run.accept(&format!("player {}", id), envelope).await {
                enrichment.players.push(envelope);
            }
        }

        Ok(enrichment)
    }

    // ------------------------------------------------------------------------
    // Player spotlight
    // ------------------------------------------------------------------------

    async fn draft_player_spotlight(
        &self,
        run: &mut Run,
        player_id: &str,
        game_id: Option<&str>,
    ) -> AgentResult<Draft> {
        let sink = run.sink.clone();
        let season = self.config.default_season;

        let (player_data, game_data) = self
            .stage(
                &sink,
                PipelineStage::Collect,
                self.collect_player(run, player_id, game_id, season),
                |(_, game)| match game {
                    Some(_) => format!("player {} and game", player_id),
                    None => format!("player {}", player_id),
                },
            )
            .await?;

        let (performance, game_facts) = self
            .stage(
                &sink,
                PipelineStage::Extract,
                async {
                    let performance = summarize_player_performance(&player_data).ok_or_else(|| {
                        AgentError::MalformedUpstreamData(format!(
                            "player {} record has no readable profile",
                            player_id
                        ))
                    })?;
                    let game_facts = game_data.as_ref().and_then(|game| match extract_game_facts(game) {
                        Ok(facts) => Some(facts),
                        Err(e) => {
                            tracing::warn!(error = %e, "Spotlight game could not be read");
                            None
                        }
                    });
                    Ok::<_, AgentError>((performance, game_facts))
                },
                |(performance, _)| performance.name.clone(),
            )
            .await?;

        let league = self
            .stage(
                &sink,
                PipelineStage::Enrich,
                self.enrich_player(run, game_facts.as_ref()),
                |league| {
                    if league.is_some() {
                        "league table".to_string()
                    } else {
                        "no supplementary sources".to_string()
                    }
                },
            )
            .await?;

        let mut context = vec![player_data.clone()];
        context.extend(league.iter().cloned());
        let (outcome, research) = self
            .stage(
                &sink,
                PipelineStage::Research,
                async {
                    let outcome = self.storylines(game_data.as_ref(), &context).await;
                    let research = ResearchContext {
                        standings: league.as_ref().and_then(analyze_standings),
                        player: Some(performance.clone()),
                        ..ResearchContext::default()
                    };
                    Ok((outcome, research))
                },
                |(outcome, _)| format!("{} storylines", outcome.storylines.len()),
            )
            .await?;
        if let Some(reason) = outcome.fallback_reason {
            run.degrade(
                PipelineStage::Research,
                format!("rule-based storylines used: {}", reason),
            )
            .await;
        }

        let input = self
            .stage(
                &sink,
                PipelineStage::Format,
                async {
                    Ok(spotlight_input(
                        &performance,
                        game_facts.as_ref(),
                        &research,
                        outcome.storylines,
                    ))
                },
                |input| format!("{} data lines", input.data_summary.lines().count()),
            )
            .await?;

        Ok(Draft {
            input,
            review: ReviewContext {
                article_type: Some(ArticleType::PlayerSpotlight),
                fixture: game_facts.map(|facts| facts.summary),
            },
        })
    }

    /// Player data, plus the game when one is named. A failed game is a degradation.
    async fn collect_player(
        &self,
        run: &mut Run,
        player_id: &str,
        game_id: Option<&str>,
        season: u32,
    ) -> AgentResult<(Envelope, Option<Envelope>)> {
        let game = async {
            match game_id {
                Some(id) => Some((id, self.collect_game(id).await)),
                None => None,
            }
        };
        let (player_data, game) =
            futures::join!(self.collector.collect_player_data(player_id, season), game);

        if !player_data.is_success() {
            return Err(AgentError::UpstreamUnavailable(format!(
                "player {}: {}",
                player_id,
                player_data.errors().join("; ")
            )));
        }
        if section_items(&player_data, "player_info").is_empty()
            && section_items(&player_data, "player_stats").is_empty()
        {
            return Err(AgentError::GameNotFound(format!(
                "no player with id {} in season {}",
                player_id, season
            )));
        }
        run.record_source(&player_data);

        let game_data = match game {
            Some((_, Ok(game_data))) => {
                run.record_source(&game_data);
                Some(game_data)
            }
            Some((id, Err(e))) => {
                run.degrade(PipelineStage::Collect, format!("game {}: {}", id, e))
                    .await;
                None
            }
            None => None,
        };

        Ok((player_data, game_data))
    }

    /// League table of the spotlight game's league, or the default league.
    async fn enrich_player(
        &self,
        run: &mut Run,
        game_facts: Option<&GameFacts>,
    ) -> AgentResult<Option<Envelope>> {
        let league = game_facts.map(|facts| &facts.summary.league);
        let league_id = league
            .and_then(|l| l.id)
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or(self.config.default_league);
        let season = league
            .and_then(|l| l.season)
            .unwrap_or(self.config.default_season);

        let league_data = self.collector.collect_league_data(league_id, season).await;
        Ok(run.accept("league data", league_data).await)
    }

    // ------------------------------------------------------------------------
    // Shared stages
    // ------------------------------------------------------------------------

    /// Storylines within the call deadline. A timed-out delegated call falls
    /// back to rule-based storylines like any other delegated failure.
    async fn storylines(&self, game_data: Option<&Envelope>, context: &[Envelope]) -> StorylineOutcome {
        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, self.researcher.research_storylines(game_data, context))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                let all: Vec<Envelope> = game_data.into_iter().chain(context).cloned().collect();
                StorylineOutcome {
                    storylines: generate_storylines(&all, self.config.storyline_cap),
                    fallback_reason: Some(format!(
                        "storyline generation timed out after {}",
                        format_duration(timeout)
                    )),
                }
            }
        }
    }

    /// Article text and the model that wrote it.
    async fn write(
        &self,
        run: &mut Run,
        article_type: ArticleType,
        input: &WriterInput,
    ) -> AgentResult<(String, String)> {
        let timeout = self.config.call_timeout;
        let result = match tokio::time::timeout(timeout, self.writer.generate(article_type, input)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::GenerationFailed(format!(
                "writer timed out after {}",
                format_duration(timeout)
            ))),
        };

        match result {
            Ok(content) => Ok((content, self.writer.model_name().to_string())),
            Err(e @ (AgentError::GenerationFailed(_) | AgentError::Llm(_)))
                if self.config.allow_fallback_article =>
            {
                run.degrade(PipelineStage::Write, format!("fallback article used: {}", e))
                    .await;
                let content = fallback_article(
                    article_type,
                    &input.subject,
                    &input.data_summary,
                    &input.storylines,
                );
                Ok((content, FALLBACK_MODEL.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

fn validate_request(request: &ArticleRequest) -> AgentResult<()> {
    let (field, value) = match request.article_type {
        ArticleType::GameRecap | ArticleType::Preview => ("game_id", request.game_id.as_deref()),
        ArticleType::PlayerSpotlight => ("player_id", request.player_id.as_deref()),
    };

    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AgentError::InvalidRequest(format!(
            "{} is required for a {}",
            field,
            request.article_type.display_name().to_lowercase()
        )));
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AgentError::InvalidRequest(format!(
            "{} must be numeric, got '{}'",
            field,
            sanitize_log_input(value)
        )));
    }

    if let Some(game_id) = request.game_id.as_deref().map(str::trim) {
        if !game_id.is_empty() && !game_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(AgentError::InvalidRequest(format!(
                "game_id must be numeric, got '{}'",
                sanitize_log_input(game_id)
            )));
        }
    }
    Ok(())
}

fn extract_game_facts(game_data: &Envelope) -> AgentResult<GameFacts> {
    let record = game_record(game_data);
    let summary = extract_fixture_summary(&record)
        .map_err(|e| AgentError::MalformedUpstreamData(e.to_string()))?;
    let events = extract_events(&record).unwrap_or_default();
    let players = match extract_player_info(&record) {
        Ok(players) => Some(players),
        Err(e) => {
            tracing::debug!(error = %e, "No player details for fixture");
            None
        }
    };
    Ok(GameFacts {
        summary,
        events,
        players,
    })
}

fn spotlight_input(
    performance: &PlayerPerformance,
    game: Option<&GameFacts>,
    research: &ResearchContext,
    storylines: Vec<String>,
) -> WriterInput {
    player_writer_input(
        performance,
        game.map(|facts| (&facts.summary, facts.events.as_slice())),
        research,
        storylines,
    )
}

/// Builder for [`ArticlePipeline`].
pub struct PipelineBuilder {
    config: ScribeConfig,
    data_source: Option<Arc<dyn FootballDataSource>>,
    llm: Option<Arc<dyn LlmProvider>>,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl PipelineBuilder {
    /// Creates a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ScribeConfig::default(),
            data_source: None,
            llm: None,
            event_tx: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ScribeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the football-data source.
    pub fn data_source(mut self, source: Arc<dyn FootballDataSource>) -> Self {
        self.data_source = Some(source);
        self
    }

    /// Sets the model provider.
    pub fn llm_client(mut self, client: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(client);
        self
    }

    /// Sets the event channel.
    pub fn event_sender(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> AgentResult<ArticlePipeline> {
        let data_source = self
            .data_source
            .ok_or_else(|| AgentError::Configuration("data source is required".to_string()))?;
        let llm = self
            .llm
            .ok_or_else(|| AgentError::Configuration("LLM client is required".to_string()))?;
        self.config
            .validate()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        let pipeline = ArticlePipeline::new(self.config, data_source, llm);
        Ok(match self.event_tx {
            Some(tx) => pipeline.with_event_sender(tx),
            None => pipeline,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
