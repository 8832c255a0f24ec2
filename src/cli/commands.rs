//! CLI command definitions for sport-scribe.
//!
//! `generate` runs the article pipeline once, `serve` starts the HTTP
//! service, and `leagues` / `fixtures` help find the ids to generate for.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::Map;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::agents::{
    extract_fixture_summary, ArticleRequest, ArticleResult, ArticleType, CollectorConfig,
    DataCollectorAgent, PipelineEvent,
};
use crate::football::{
    find_league, format_match_score, league_display_name, ApiFootballClient, Envelope, LEAGUES,
};
use crate::pipeline::{ArticlePipeline, Environment, ScribeConfig};
use crate::server::{self, AppState};

/// Football article generator backed by API-Football and a language model.
#[derive(Parser)]
#[command(name = "sport-scribe")]
#[command(about = "Generate football articles from live match data")]
#[command(version)]
#[command(
    long_about = "sport-scribe collects match data from API-Football, researches storylines and writes \
                  game recaps, previews and player spotlights with a language model.\n\n\
                  Example usage:\n  sport-scribe generate --game-id 239625\n  sport-scribe serve --port 8000"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate one article.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Serve the article HTTP API.
    Serve(ServeArgs),

    /// List the well-known leagues and their ids.
    Leagues(LeaguesArgs),

    /// List the fixtures of a league on one day.
    Fixtures(FixturesArgs),
}

/// Arguments for the generate command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Article type: game_recap, preview or player_spotlight.
    #[arg(short = 't', long = "type", default_value = "game_recap")]
    pub article_type: String,

    /// API-Football fixture id.
    #[arg(short = 'g', long)]
    pub game_id: Option<String>,

    /// API-Football player id (player spotlights).
    #[arg(short = 'p', long)]
    pub player_id: Option<String>,

    /// Requested article length in words.
    #[arg(long)]
    pub target_length: Option<u32>,

    /// Requested tone, e.g. "neutral" or "celebratory".
    #[arg(long)]
    pub tone: Option<String>,

    /// Model override (defaults to OPENAI_MODEL).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Fall back to a template article when the model fails.
    #[arg(long)]
    pub allow_fallback: bool,

    /// Write the article to this file instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Output the full result as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for the serve command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Bind host (defaults to SCRIBE_HOST).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (defaults to SCRIBE_PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the leagues command.
#[derive(Parser, Debug)]
pub struct LeaguesArgs {
    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for the fixtures command.
#[derive(Parser, Debug)]
pub struct FixturesArgs {
    /// League key or id, e.g. premier_league or 39.
    #[arg(short = 'L', long, default_value = "premier_league")]
    pub league: String,

    /// Day to list (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(short = 'd', long)]
    pub date: Option<String>,

    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Serve(args) => run_serve_command(args).await,
        Commands::Leagues(args) => run_leagues_command(args),
        Commands::Fixtures(args) => run_fixtures_command(args).await,
    }
}

// ============================================================================
// Generate Command Implementation
// ============================================================================

impl GenerateArgs {
    fn to_request(&self) -> anyhow::Result<ArticleRequest> {
        let article_type: ArticleType = self.article_type.parse()?;
        Ok(ArticleRequest {
            article_type,
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
            target_length: self.target_length,
            tone: self.tone.clone(),
        })
    }

    fn apply_overrides(&self, mut config: ScribeConfig) -> ScribeConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if self.allow_fallback {
            config = config.with_fallback_article(true);
        }
        config
    }
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let request = args.to_request()?;
    let config = args.apply_overrides(
        ScribeConfig::from_env().context("Failed to load configuration from environment")?,
    );

    let (tx, rx) = mpsc::channel(64);
    let pipeline = ArticlePipeline::from_config(config)?.with_event_sender(tx);
    let progress = if args.json {
        drop(rx);
        None
    } else {
        Some(tokio::spawn(print_progress(rx)))
    };

    let result = pipeline.generate(request).await;
    // Closes the event channel so the progress printer finishes.
    drop(pipeline);
    if let Some(progress) = progress {
        let _ = progress.await;
    }
    let article = result?;

    match &args.output {
        Some(path) => {
            write_article(Path::new(path), &article, args.json)?;
            info!(path = %path, words = article.metadata.word_count, "Article written");
            if !args.json {
                println!("Article written to {}", path);
            }
        }
        None if args.json => println!("{}", serde_json::to_string_pretty(&article)?),
        None => println!("{}", article.content),
    }

    if article.metadata.is_degraded() {
        for degradation in &article.metadata.degradations {
            warn!(stage = %degradation.stage, reason = %degradation.reason, "Degraded");
        }
    }
    Ok(())
}

async fn print_progress(mut rx: mpsc::Receiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::StageStarted { stage, .. } => {
                eprintln!("  {} ...", stage.display_name());
            }
            PipelineEvent::StageCompleted { stage, summary, .. } => {
                eprintln!("  {} done: {}", stage.display_name(), summary);
            }
            PipelineEvent::StageDegraded { stage, reason, .. } => {
                eprintln!("  {} degraded: {}", stage.display_name(), reason);
            }
            PipelineEvent::StageFailed { stage, error, .. } => {
                eprintln!("  {} failed: {}", stage.display_name(), error);
            }
            PipelineEvent::PipelineCompleted { duration_ms, .. } => {
                eprintln!("Completed in {:.1}s", duration_ms as f64 / 1000.0);
            }
            PipelineEvent::PipelineFailed { .. } => {}
        }
    }
}

/// Writes the article text, or the full result as JSON.
fn write_article(path: &Path, article: &ArticleResult, json: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let body = if json {
        serde_json::to_string_pretty(article)?
    } else {
        article.content.clone()
    };
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Serve Command Implementation
// ============================================================================

async fn run_serve_command(args: ServeArgs) -> anyhow::Result<()> {
    let (state, mut address) = match ScribeConfig::from_env() {
        Ok(config) => {
            let environment = config.environment;
            let address = config.bind_address();
            match ArticlePipeline::from_config(config) {
                Ok(pipeline) => (AppState::ready(Arc::new(pipeline), environment), address),
                Err(e) => {
                    error!(error = %e, "Pipeline failed to start; serving 503");
                    (AppState::not_ready(environment), address)
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Configuration invalid; serving 503");
            let environment = std::env::var("ENVIRONMENT")
                .ok()
                .and_then(|v| v.parse::<Environment>().ok())
                .unwrap_or_default();
            (AppState::not_ready(environment), ScribeConfig::default().bind_address())
        }
    };

    if args.host.is_some() || args.port.is_some() {
        let (default_host, default_port) = address
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_default();
        address = format!(
            "{}:{}",
            args.host.unwrap_or(default_host),
            args.port.map(|p| p.to_string()).unwrap_or(default_port)
        );
    }

    server::serve(state, &address)
        .await
        .with_context(|| format!("Server on {} failed", address))
}

// ============================================================================
// Leagues and Fixtures Commands
// ============================================================================

#[derive(Debug, Serialize)]
struct LeagueRow {
    key: &'static str,
    id: u32,
    name: &'static str,
}

fn run_leagues_command(args: LeaguesArgs) -> anyhow::Result<()> {
    let rows: Vec<LeagueRow> = LEAGUES
        .iter()
        .map(|l| LeagueRow {
            key: l.key,
            id: l.id,
            name: l.display_name,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in rows {
            println!("{:>4}  {:<18} {}", row.id, row.key, row.name);
        }
    }
    Ok(())
}

/// One line of the fixtures listing.
#[derive(Debug, Serialize, PartialEq)]
struct FixtureRow {
    fixture_id: Option<u64>,
    home: String,
    away: String,
    score: Option<String>,
    status: Option<String>,
}

fn parse_date(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw)),
        None => Ok(Utc::now().date_naive()),
    }
}

fn fixture_rows(envelope: &Envelope) -> Vec<FixtureRow> {
    envelope
        .response()
        .iter()
        .filter_map(|item| {
            let single = Envelope::success(envelope.get(), Map::new(), vec![item.clone()]);
            extract_fixture_summary(&single).ok()
        })
        .map(|summary| FixtureRow {
            fixture_id: summary.fixture_id,
            score: match (summary.home_goals, summary.away_goals) {
                (Some(home), Some(away)) => Some(format_match_score(home, away)),
                _ => None,
            },
            home: summary.home_team.name,
            away: summary.away_team.name,
            status: summary.status_short,
        })
        .collect()
}

async fn run_fixtures_command(args: FixturesArgs) -> anyhow::Result<()> {
    let league_id = match find_league(&args.league) {
        Some(league) => league.id,
        None => args
            .league
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Unknown league '{}'", args.league))?,
    };
    let date = parse_date(args.date.as_deref())?;

    let client = ApiFootballClient::from_env()?;
    let collector = DataCollectorAgent::new(
        Arc::new(client),
        CollectorConfig::new().with_call_timeout(Duration::from_secs(30)),
    );
    let envelope = collector.find_fixtures(league_id, date).await;
    if !envelope.is_success() {
        anyhow::bail!("Fixture lookup failed: {}", envelope.errors().join("; "));
    }

    let rows = fixture_rows(&envelope);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} fixtures on {}", league_display_name(league_id), date);
    if rows.is_empty() {
        println!("  (none)");
    }
    for row in rows {
        println!(
            "{:>8}  {} {} {}  [{}]",
            row.fixture_id.map(|id| id.to_string()).unwrap_or_default(),
            row.home,
            row.score.as_deref().unwrap_or("vs"),
            row.away,
            row.status.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{ArticleMetadata, PipelineStage};
    use crate::testing::sample_fixture;
    use clap::CommandFactory;
    use uuid::Uuid;

    fn sample_article() -> ArticleResult {
        ArticleResult {
            content: "Headline: Wydad AC edge Rapide Oued ZEM\n\nBody:\nA late penalty.".to_string(),
            metadata: ArticleMetadata {
                article_id: Uuid::new_v4(),
                article_type: ArticleType::GameRecap,
                game_id: Some("239625".to_string()),
                player_id: None,
                headline: Some("Wydad AC edge Rapide Oued ZEM".to_string()),
                slug: None,
                storylines: Vec::new(),
                generated_at: Utc::now(),
                pipeline_duration_ms: 1200,
                data_sources: vec!["api-football:game_data".to_string()],
                model_used: "gpt-4-turbo".to_string(),
                word_count: 9,
                review_feedback: None,
                degradations: vec![crate::agents::Degradation::new(
                    PipelineStage::Enrich,
                    "head-to-head: HTTP 404",
                )],
                pipeline_version: "1.0.0".to_string(),
            },
        }
    }

    #[test]
    fn test_cli_parses() {
        // Verify CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_command_defaults() {
        let cli = Cli::try_parse_from(["sport-scribe", "generate", "-g", "239625"]).expect("should parse");

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.article_type, "game_recap");
                assert_eq!(args.game_id.as_deref(), Some("239625"));
                assert!(args.output.is_none());
                assert!(!args.allow_fallback);
                assert!(!args.json);

                let request = args.to_request().expect("request");
                assert_eq!(request.article_type, ArticleType::GameRecap);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_command_with_all_options() {
        let args = vec![
            "sport-scribe",
            "gen",
            "--type",
            "player_spotlight",
            "-p",
            "36544",
            "-g",
            "239625",
            "--target-length",
            "600",
            "--tone",
            "celebratory",
            "-m",
            "gpt-4o",
            "--allow-fallback",
            "-o",
            "./article.md",
            "-j",
        ];
        let cli = Cli::try_parse_from(args).expect("should parse");

        match cli.command {
            Commands::Generate(args) => {
                let request = args.to_request().expect("request");
                assert_eq!(request.article_type, ArticleType::PlayerSpotlight);
                assert_eq!(request.player_id.as_deref(), Some("36544"));
                assert_eq!(request.target_length, Some(600));
                assert_eq!(request.tone.as_deref(), Some("celebratory"));

                let config = args.apply_overrides(ScribeConfig::default());
                assert_eq!(config.model, "gpt-4o");
                assert!(config.allow_fallback_article);
                assert_eq!(args.output.as_deref(), Some("./article.md"));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_unknown_article_type_is_rejected() {
        let cli = Cli::try_parse_from(["sport-scribe", "generate", "-t", "haiku"]).expect("should parse");
        match cli.command {
            Commands::Generate(args) => assert!(args.to_request().is_err()),
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_serve_and_fixtures_parse() {
        let cli = Cli::try_parse_from(["sport-scribe", "serve", "--port", "9000", "-l", "debug"])
            .expect("should parse");
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.host.is_none());
            }
            _ => panic!("Expected Serve command"),
        }

        let cli = Cli::try_parse_from(["sport-scribe", "fixtures", "-L", "la_liga", "-d", "2024-03-02"])
            .expect("should parse");
        match cli.command {
            Commands::Fixtures(args) => {
                assert_eq!(args.league, "la_liga");
                assert_eq!(
                    parse_date(args.date.as_deref()).expect("date"),
                    NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid date")
                );
            }
            _ => panic!("Expected Fixtures command"),
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date(Some("02/03/2024")).is_err());
        assert!(parse_date(None).is_ok());
    }

    #[test]
    fn test_fixture_rows() {
        let envelope = Envelope::success("fixtures", Map::new(), vec![sample_fixture()]);
        let rows = fixture_rows(&envelope);
        assert_eq!(
            rows,
            vec![FixtureRow {
                fixture_id: Some(239625),
                home: "Rapide Oued ZEM".to_string(),
                away: "Wydad AC".to_string(),
                score: Some("1-2".to_string()),
                status: Some("FT".to_string()),
            }]
        );
    }

    #[test]
    fn test_write_article_text_and_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let article = sample_article();

        let text_path = dir.path().join("out").join("recap.md");
        write_article(&text_path, &article, false).expect("write text");
        assert_eq!(
            fs::read_to_string(&text_path).expect("read text"),
            article.content
        );

        let json_path = dir.path().join("recap.json");
        write_article(&json_path, &article, true).expect("write json");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).expect("read json")).expect("json");
        assert_eq!(value["metadata"]["game_id"], "239625");
        assert_eq!(value["metadata"]["degradations"][0]["stage"], "enrich");
    }
}
