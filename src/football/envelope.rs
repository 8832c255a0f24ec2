//! Uniform wrapper for football-data responses.
//!
//! Every fetch, whether it reached the API or not, produces an [`Envelope`]
//! with the same six fields the upstream API uses. Failures are data, not
//! `Err`: a failed envelope has non-empty `errors`, `results == 0` and an
//! empty `response`. The constructors are the only way to build one, which
//! keeps that invariant true everywhere.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Result of one data-source call, or of an aggregate of calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Endpoint or aggregate name, e.g. `"fixtures"` or `"game_data"`.
    get: String,
    parameters: Map<String, Value>,
    errors: Vec<String>,
    results: u64,
    paging: BTreeMap<String, u64>,
    response: Vec<Value>,
    /// Unparseable body text, kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_body: Option<String>,
}

impl Envelope {
    /// Builds a successful envelope; `results` is the length of `response`.
    pub fn success(
        get: impl Into<String>,
        parameters: Map<String, Value>,
        response: Vec<Value>,
    ) -> Self {
        Self {
            get: get.into(),
            parameters,
            errors: Vec::new(),
            results: response.len() as u64,
            paging: default_paging(),
            response,
            raw_body: None,
        }
    }

    /// Builds a failed envelope. An empty error list is replaced with a
    /// generic message so the failure cannot be mistaken for success.
    pub fn failure(
        get: impl Into<String>,
        parameters: Map<String, Value>,
        errors: Vec<String>,
    ) -> Self {
        let errors = if errors.is_empty() {
            vec!["Unknown error".to_string()]
        } else {
            errors
        };
        Self {
            get: get.into(),
            parameters,
            errors,
            results: 0,
            paging: BTreeMap::new(),
            response: Vec::new(),
            raw_body: None,
        }
    }

    /// Attaches the raw body of a response that could not be parsed.
    pub fn with_raw_body(mut self, raw_body: impl Into<String>) -> Self {
        self.raw_body = Some(raw_body.into());
        self
    }

    /// Replaces paging information on a successful envelope.
    pub fn with_paging(mut self, paging: BTreeMap<String, u64>) -> Self {
        if self.is_success() {
            self.paging = paging;
        }
        self
    }

    pub fn get(&self) -> &str {
        &self.get
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn results(&self) -> u64 {
        self.results
    }

    pub fn paging(&self) -> &BTreeMap<String, u64> {
        &self.paging
    }

    pub fn response(&self) -> &[Value] {
        &self.response
    }

    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    /// True when `errors` is empty. Says nothing about `response` being non-empty.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when the call succeeded but returned nothing.
    pub fn is_empty(&self) -> bool {
        self.is_success() && self.response.is_empty()
    }

    /// First element of `response`, if any.
    pub fn first(&self) -> Option<&Value> {
        self.response.first()
    }

    /// Consumes the envelope, returning its `response` items.
    pub fn into_response(self) -> Vec<Value> {
        self.response
    }
}

fn default_paging() -> BTreeMap<String, u64> {
    BTreeMap::from([("current".to_string(), 1), ("total".to_string(), 1)])
}

/// Builds a parameter map from `(key, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
