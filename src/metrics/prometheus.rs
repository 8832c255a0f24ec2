//! Prometheus metrics registration and export.

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};

/// Global Prometheus registry for all sport-scribe metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Articles produced, labeled by status and article type.
pub static ARTICLES_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// End-to-end pipeline duration in seconds, labeled by article type.
pub static ARTICLE_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Pipeline stage failures, labeled by stage.
pub static STAGE_FAILURES_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Stages that completed in a degraded mode, labeled by stage.
pub static DEGRADATIONS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Football API calls, labeled by endpoint and outcome.
pub static UPSTREAM_REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Text-generation calls, labeled by model and outcome.
pub static LLM_REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Text-generation latency in seconds, labeled by model.
pub static LLM_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize all metrics and register them with the registry.
///
/// Safe to call more than once; later calls leave the first registry in place.
///
/// # Errors
///
/// Returns a `prometheus::Error` if a metric definition is invalid.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let articles_total = CounterVec::new(
        Opts::new("sport_scribe_articles_total", "Total articles generated"),
        &["status", "article_type"],
    )?;

    let article_duration = HistogramVec::new(
        HistogramOpts::new(
            "sport_scribe_article_duration_seconds",
            "End-to-end article pipeline duration in seconds",
        )
        .buckets(vec![1.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["article_type"],
    )?;

    let stage_failures_total = CounterVec::new(
        Opts::new(
            "sport_scribe_stage_failures_total",
            "Pipeline stage failures",
        ),
        &["stage"],
    )?;

    let degradations_total = CounterVec::new(
        Opts::new(
            "sport_scribe_degradations_total",
            "Pipeline stages that completed in a degraded mode",
        ),
        &["stage"],
    )?;

    let upstream_requests_total = CounterVec::new(
        Opts::new(
            "sport_scribe_upstream_requests_total",
            "Football API requests",
        ),
        &["endpoint", "status"],
    )?;

    let llm_requests_total = CounterVec::new(
        Opts::new("sport_scribe_llm_requests_total", "Total LLM API requests"),
        &["model", "status"],
    )?;

    let llm_latency = HistogramVec::new(
        HistogramOpts::new(
            "sport_scribe_llm_latency_seconds",
            "LLM API request latency in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["model"],
    )?;

    registry.register(Box::new(articles_total.clone()))?;
    registry.register(Box::new(article_duration.clone()))?;
    registry.register(Box::new(stage_failures_total.clone()))?;
    registry.register(Box::new(degradations_total.clone()))?;
    registry.register(Box::new(upstream_requests_total.clone()))?;
    registry.register(Box::new(llm_requests_total.clone()))?;
    registry.register(Box::new(llm_latency.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = ARTICLES_TOTAL.set(articles_total);
    let _ = ARTICLE_DURATION.set(article_duration);
    let _ = STAGE_FAILURES_TOTAL.set(stage_failures_total);
    let _ = DEGRADATIONS_TOTAL.set(degradations_total);
    let _ = UPSTREAM_REQUESTS_TOTAL.set(upstream_requests_total);
    let _ = LLM_REQUESTS_TOTAL.set(llm_requests_total);
    let _ = LLM_LATENCY.set(llm_latency);

    tracing::info!("Prometheus metrics initialized successfully");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns a comment line instead of failing when the registry is missing
/// or encoding breaks, so a scrape never errors.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}

/// HTTP handler body for `GET /metrics`.
pub async fn metrics_handler() -> String {
    export_metrics()
}
