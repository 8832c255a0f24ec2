//! Command-line interface for sport-scribe.
//!
//! Provides commands for article generation, the HTTP service and
//! league/fixture lookups.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
