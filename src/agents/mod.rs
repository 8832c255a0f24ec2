//! Agents for the football article pipeline.
//!
//! Each agent owns one concern and knows nothing about the others:
//!
//! - [`collector`] fetches raw football data, bounded and time-limited
//! - [`extract`] turns raw envelopes into typed match facts
//! - [`researcher`] builds storylines and historical context
//! - [`format`] shapes facts and research into writer input
//! - [`writer`] produces the article text
//! - [`editor`] reviews the result without changing it

pub mod collector;
pub mod editor;
pub mod error;
pub mod extract;
pub mod format;
pub mod researcher;
pub mod types;
pub mod writer;

pub use collector::{aggregates, build_aggregate, CollectorConfig, DataCollectorAgent};
pub use editor::{
    fact_check, style_check, EditorAgent, EditorFeedback, FactCheck, ReviewContext, StyleReport,
};
pub use error::{AgentError, AgentResult};
pub use extract::{
    extract_events, extract_fixture_summary, extract_player_info, extract_team_info, game_record,
    section_errors, section_items, ExtractionError, FixtureSummary, KeyAchievement, LeagueRef,
    Lineup, LineupStatus, MatchEvent, PlayerEntry, PlayerInfo, RosterEntry, TeamInfo, TeamRef,
    TeamSide,
};
pub use format::{game_writer_input, player_writer_input, WriterInput};
pub use researcher::{
    analyze_game_data, analyze_head_to_head, analyze_standings, generate_storylines,
    summarize_player_performance, summarize_team_data, HeadToHeadSummary, PlayerPerformance,
    ResearchAgent, ResearchContext, ResearcherConfig, StandingRow, StandingsSummary,
    StorylineOutcome, StorylineStrategy, TeamForm, DEFAULT_STORYLINE_CAP,
};
pub use types::{
    ArticleMetadata, ArticleRequest, ArticleResult, ArticleType, Degradation, PipelineEvent,
    PipelineStage,
};
pub use writer::{
    extract_headline, fallback_article, validate_article, WordRange, WriterConfig, WritingAgent,
};
