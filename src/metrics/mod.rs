//! Prometheus-based monitoring for the article pipeline.
//!
//! # Example
//!
//! ```ignore
//! use sport_scribe::metrics::{export_metrics, init_metrics, MetricsCollector};
//!
//! init_metrics().expect("Failed to initialize metrics");
//! MetricsCollector::new().record_article("success", "game_recap", 8.2);
//! let metrics_text = export_metrics();
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use prometheus::{export_metrics, init_metrics, metrics_handler, REGISTRY};
