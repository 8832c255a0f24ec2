//! Football-data access: the response envelope, the API adapter and the
//! league catalogue.

pub mod client;
pub mod envelope;
pub mod leagues;

pub use client::{
    endpoints, envelope_from_http, ApiFootballClient, FootballClientError, FootballDataSource,
    DEFAULT_BASE_URL,
};
pub use envelope::{params, Envelope};
pub use leagues::{
    article_slug, find_league, format_match_score, league_display_name, League, LEAGUES,
};
