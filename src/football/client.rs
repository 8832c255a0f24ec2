//! Football-data source adapter.
//!
//! [`FootballDataSource`] is the seam the collector agent depends on. The
//! production implementation, [`ApiFootballClient`], performs exactly one
//! HTTP GET per call against API-Football (RapidAPI) and folds every outcome
//! into an [`Envelope`]. It never returns `Err` and never panics, so callers
//! branch on `envelope.is_success()` instead of matching transport errors.
//!
//! # Example
//!
//! ```ignore
//! use sport_scribe::football::{params, ApiFootballClient, FootballDataSource};
//!
//! let client = ApiFootballClient::from_env()?;
//! let envelope = client.fetch("fixtures", params([("id", 1035037)])).await;
//! if !envelope.is_success() {
//!     eprintln!("fixture lookup failed: {:?}", envelope.errors());
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;

use super::envelope::Envelope;
use crate::metrics::MetricsCollector;

/// Default API-Football base URL on RapidAPI.
pub const DEFAULT_BASE_URL: &str = "https://api-football-v1.p.rapidapi.com/v3";

/// RapidAPI host header value for API-Football.
pub const RAPIDAPI_HOST: &str = "api-football-v1.p.rapidapi.com";

/// Endpoint paths used by the collector.
pub mod endpoints {
    pub const FIXTURES: &str = "fixtures";
    pub const FIXTURE_EVENTS: &str = "fixtures/events";
    pub const FIXTURE_LINEUPS: &str = "fixtures/lineups";
    pub const FIXTURE_STATISTICS: &str = "fixtures/statistics";
    pub const HEAD_TO_HEAD: &str = "fixtures/headtohead";
    pub const TEAMS: &str = "teams";
    pub const TEAM_STATISTICS: &str = "teams/statistics";
    pub const PLAYERS: &str = "players";
    pub const TRANSFERS: &str = "transfers";
    pub const STANDINGS: &str = "standings";
}

/// Errors raised while constructing a client. Fetches themselves never fail.
#[derive(Debug, Error)]
pub enum FootballClientError {
    #[error("Missing API key: RAPIDAPI_KEY environment variable not set")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    Http(String),
}

/// A source of football data.
#[async_trait]
pub trait FootballDataSource: Send + Sync {
    /// Performs one call against `endpoint`. Failures are reported inside the envelope.
    async fn fetch(&self, endpoint: &str, params: Map<String, Value>) -> Envelope;
}

/// API-Football client authenticated with RapidAPI headers.
pub struct ApiFootballClient {
    base_url: String,
    api_key: String,
    http_client: Client,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for ApiFootballClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiFootballClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiFootballClient {
    /// Creates a client.
    ///
    /// `timeout` bounds a single HTTP exchange; the pipeline applies its own
    /// per-call deadline on top.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FootballClientError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FootballClientError::MissingApiKey);
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FootballClientError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            http_client,
            metrics: MetricsCollector::new(),
        })
    }

    /// Creates a client from `RAPIDAPI_KEY` and optional `API_FOOTBALL_BASE_URL`.
    pub fn from_env() -> Result<Self, FootballClientError> {
        let api_key =
            std::env::var("RAPIDAPI_KEY").map_err(|_| FootballClientError::MissingApiKey)?;
        let base_url =
            std::env::var("API_FOOTBALL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, api_key, Duration::from_secs(30))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FootballDataSource for ApiFootballClient {
    async fn fetch(&self, endpoint: &str, params: Map<String, Value>) -> Envelope {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.clone(), query_value(v)))
            .collect();

        tracing::debug!(endpoint = endpoint, params = ?query, "Fetching football data");

        let result = self
            .http_client
            .get(&url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .query(&query)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(endpoint = endpoint, error = %e, "Football API request failed");
                self.metrics.record_upstream_request(endpoint, "transport_error");
                return Envelope::failure(endpoint, params, vec![format!("Request failed: {}", e)]);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.metrics.record_upstream_request(endpoint, "transport_error");
                return Envelope::failure(
                    endpoint,
                    params,
                    vec![format!("Failed to read response body: {}", e)],
                );
            }
        };

        let envelope = envelope_from_http(endpoint, params, status, &body);
        if envelope.is_success() {
            self.metrics.record_upstream_request(endpoint, "success");
        } else {
            tracing::warn!(
                endpoint = endpoint,
                status = status,
                errors = ?envelope.errors(),
                "Football API returned an error"
            );
            self.metrics.record_upstream_request(endpoint, "error");
        }
        envelope
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Folds one HTTP exchange into an [`Envelope`].
///
/// * status other than 200: `"HTTP {status}"`
/// * body that is not JSON: `"Failed to parse JSON response"`, raw body kept
/// * upstream `errors` present (list or object form): those messages
/// * otherwise: the upstream `response`, with paging when provided
pub fn envelope_from_http(
    endpoint: &str,
    params: Map<String, Value>,
    status: u16,
    body: &str,
) -> Envelope {
    if status != 200 {
        return Envelope::failure(endpoint, params, vec![format!("HTTP {}", status)]);
    }

    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            return Envelope::failure(
                endpoint,
                params,
                vec!["Failed to parse JSON response".to_string()],
            )
            .with_raw_body(body)
        }
    };

    let upstream_errors = upstream_errors(parsed.get("errors"));
    if !upstream_errors.is_empty() {
        return Envelope::failure(endpoint, params, upstream_errors);
    }

    let response = match parsed.get("response") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    };

    let paging: BTreeMap<String, u64> = parsed
        .get("paging")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default();

    let envelope = Envelope::success(endpoint, params, response);
    if paging.is_empty() {
        envelope
    } else {
        envelope.with_paging(paging)
    }
}

fn upstream_errors(errors: Option<&Value>) -> Vec<String> {
    match errors {
        Some(Value::Array(items)) => items.iter().map(query_value).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, query_value(v)))
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::football::envelope::params;
    use serde_json::json;

    #[test]
    fn test_non_200_is_failure() {
        let envelope = envelope_from_http("fixtures", params([("id", 1)]), 503, "{}");
        assert_eq!(envelope.errors(), ["HTTP 503".to_string()]);
        assert!(envelope.response().is_empty());
        assert_eq!(envelope.results(), 0);
    }

    #[test]
    fn test_unparseable_body_keeps_raw_text() {
        let envelope = envelope_from_http("fixtures", Map::new(), 200, "<html>oops</html>");
        assert_eq!(
            envelope.errors(),
            ["Failed to parse JSON response".to_string()]
        );
        assert_eq!(envelope.raw_body(), Some("<html>oops</html>"));
    }

    #[test]
    fn test_upstream_error_object_form() {
        let body = json!({
            "get": "fixtures",
            "errors": {"token": "Error/Missing application key"},
            "results": 0,
            "response": []
        })
        .to_string();
        let envelope = envelope_from_http("fixtures", Map::new(), 200, &body);
        assert_eq!(
            envelope.errors(),
            ["token: Error/Missing application key".to_string()]
        );
    }

    #[test]
    fn test_upstream_empty_errors_list_is_success() {
        let body = json!({
            "get": "fixtures",
            "errors": [],
            "results": 1,
            "paging": {"current": 1, "total": 3},
            "response": [{"fixture": {"id": 7}}]
        })
        .to_string();
        let envelope = envelope_from_http("fixtures", params([("id", 7)]), 200, &body);
        assert!(envelope.is_success());
        assert_eq!(envelope.results(), 1);
        assert_eq!(envelope.paging().get("total"), Some(&3));
        assert_eq!(envelope.response()[0]["fixture"]["id"], json!(7));
    }

    #[test]
    fn test_client_requires_key() {
        let result = ApiFootballClient::new(DEFAULT_BASE_URL, "", Duration::from_secs(1));
        assert!(matches!(result, Err(FootballClientError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_connection_error_becomes_envelope() {
        let client = ApiFootballClient::new("http://localhost:65535", "key", Duration::from_secs(2))
            .expect("client builds");

        let envelope = client.fetch(endpoints::FIXTURES, params([("id", 1)])).await;

        assert!(!envelope.is_success());
        assert!(envelope.errors()[0].starts_with("Request failed"));
        assert_eq!(envelope.get(), "fixtures");
    }
}
