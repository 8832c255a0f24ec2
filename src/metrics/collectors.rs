//! High-level recording interface over the raw Prometheus metrics.
//!
//! Every method is a no-op when [`super::init_metrics`] has not run, so
//! library users and tests can drive the pipeline without a registry.

use super::prometheus::{
    ARTICLES_TOTAL, ARTICLE_DURATION, DEGRADATIONS_TOTAL, LLM_LATENCY, LLM_REQUESTS_TOTAL,
    STAGE_FAILURES_TOTAL, UPSTREAM_REQUESTS_TOTAL,
};

/// Metrics collector for recording pipeline operational metrics.
///
/// # Example
///
/// ```ignore
/// use sport_scribe::metrics::{init_metrics, MetricsCollector};
///
/// init_metrics().expect("Failed to init metrics");
/// let collector = MetricsCollector::new();
/// collector.record_article("success", "game_recap", 12.4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record a finished pipeline run.
    ///
    /// * `status` - "success" or "failure"
    /// * `article_type` - e.g. "game_recap"
    /// * `duration_secs` - wall-clock time of the run
    pub fn record_article(&self, status: &str, article_type: &str, duration_secs: f64) {
        if let Some(articles_total) = ARTICLES_TOTAL.get() {
            articles_total
                .with_label_values(&[status, article_type])
                .inc();
        }

        if let Some(duration) = ARTICLE_DURATION.get() {
            duration
                .with_label_values(&[article_type])
                .observe(duration_secs);
        }

        tracing::trace!(
            status = status,
            article_type = article_type,
            duration_secs = duration_secs,
            "Recorded article metric"
        );
    }

    /// Record a failed pipeline stage.
    pub fn record_stage_failure(&self, stage: &str) {
        if let Some(failures) = STAGE_FAILURES_TOTAL.get() {
            failures.with_label_values(&[stage]).inc();
        }
        tracing::trace!(stage = stage, "Recorded stage failure");
    }

    /// Record a stage that completed in a degraded mode.
    pub fn record_degradation(&self, stage: &str) {
        if let Some(degradations) = DEGRADATIONS_TOTAL.get() {
            degradations.with_label_values(&[stage]).inc();
        }
        tracing::trace!(stage = stage, "Recorded degradation");
    }

    /// Record one football API call.
    pub fn record_upstream_request(&self, endpoint: &str, status: &str) {
        if let Some(requests) = UPSTREAM_REQUESTS_TOTAL.get() {
            requests.with_label_values(&[endpoint, status]).inc();
        }
    }

    /// Record one text-generation call.
    pub fn record_llm_request(&self, model: &str, success: bool, latency_secs: f64) {
        let status = if success { "success" } else { "failure" };

        if let Some(requests) = LLM_REQUESTS_TOTAL.get() {
            requests.with_label_values(&[model, status]).inc();
        }

        if let Some(latency) = LLM_LATENCY.get() {
            latency.with_label_values(&[model]).observe(latency_secs);
        }

        tracing::trace!(
            model = model,
            success = success,
            latency_secs = latency_secs,
            "Recorded LLM request metric"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{export_metrics, init_metrics};

    #[test]
    fn test_recording_without_init_is_noop() {
        let collector = MetricsCollector::new();
        collector.record_stage_failure("collect");
        collector.record_upstream_request("fixtures", "success");
    }

    #[test]
    fn test_recorded_metrics_are_exported() {
        init_metrics().expect("metrics init");
        let collector = MetricsCollector::new();
        collector.record_degradation("enrich");
        collector.record_llm_request("gpt-4-turbo", true, 1.5);

        let exported = export_metrics();
        assert!(exported.contains("sport_scribe_degradations_total"));
        assert!(exported.contains("gpt-4-turbo"));
    }
}
