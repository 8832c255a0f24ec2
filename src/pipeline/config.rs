//! Configuration for the article pipeline and the service around it.
//!
//! This module provides the credentials for the football-data and
//! text-generation APIs, generation settings, storyline and article limits,
//! concurrency bounds, and the HTTP bind address.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::agents::collector::CollectorConfig;
use crate::agents::researcher::{ResearcherConfig, StorylineStrategy, DEFAULT_STORYLINE_CAP};
use crate::agents::writer::{WordRange, WriterConfig};
use crate::football::DEFAULT_BASE_URL;
use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// Largest accepted storyline cap.
pub const MAX_STORYLINE_CAP: usize = 10;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Deployment environment reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "expected development, staging or production, got '{}'",
                other
            )),
        }
    }
}

/// Configuration for the article pipeline.
#[derive(Clone)]
pub struct ScribeConfig {
    // Upstream APIs
    /// RapidAPI key for the football-data API.
    pub rapidapi_key: String,
    /// Base URL of the football-data API.
    pub football_base_url: String,
    /// Bearer token for the text-generation API.
    pub llm_api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub llm_api_base: String,

    // Generation settings
    /// Model used for articles and delegated storylines.
    pub model: String,
    /// Temperature for article generation. Delegated storylines keep the
    /// researcher's own lower default (see [`ResearcherConfig`]).
    pub temperature: f64,
    /// Token limit for one article. Storyline calls use the researcher's
    /// smaller limit.
    pub max_tokens: u32,

    // Football defaults
    /// League used when a request does not name one.
    pub default_league: u32,
    /// Season used when a request does not name one.
    pub default_season: u32,

    // Storylines and articles
    /// Maximum storylines passed to the writer.
    pub storyline_cap: usize,
    pub storyline_strategy: StorylineStrategy,
    /// Accepted article length. `None` disables the length check.
    pub word_range: Option<WordRange>,
    /// Publish a template article when generation fails.
    pub allow_fallback_article: bool,

    // Concurrency and deadlines
    /// Upper bound on concurrent upstream calls.
    pub max_concurrent_requests: usize,
    /// Deadline for each upstream or LLM call.
    pub call_timeout: Duration,

    // Service
    pub environment: Environment,
    pub host: String,
    pub port: u16,
}

impl std::fmt::Debug for ScribeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScribeConfig")
            .field("football_base_url", &self.football_base_url)
            .field("llm_api_base", &self.llm_api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("default_league", &self.default_league)
            .field("default_season", &self.default_season)
            .field("storyline_cap", &self.storyline_cap)
            .field("storyline_strategy", &self.storyline_strategy)
            .field("word_range", &self.word_range)
            .field("allow_fallback_article", &self.allow_fallback_article)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("call_timeout", &self.call_timeout)
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            rapidapi_key: String::new(),
            football_base_url: DEFAULT_BASE_URL.to_string(),
            llm_api_key: String::new(),
            llm_api_base: DEFAULT_API_BASE.to_string(),

            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2000,

            default_league: 39,
            default_season: 2024,

            storyline_cap: DEFAULT_STORYLINE_CAP,
            storyline_strategy: StorylineStrategy::Delegated,
            word_range: None,
            allow_fallback_article: false,

            max_concurrent_requests: 4,
            call_timeout: Duration::from_secs(60),

            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ScribeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RAPIDAPI_KEY`: football-data API key (required)
    /// - `API_FOOTBALL_BASE_URL`: football-data base URL
    /// - `OPENAI_API_KEY`: text-generation API key (required)
    /// - `OPENAI_API_BASE`: text-generation base URL (default: https://api.openai.com/v1)
    /// - `OPENAI_MODEL`: model name (default: gpt-4-turbo)
    /// - `SCRIBE_TEMPERATURE`: temperature (default: 0.7)
    /// - `SCRIBE_MAX_TOKENS`: token limit per article (default: 2000)
    /// - `SCRIBE_DEFAULT_LEAGUE`: default league id (default: 39)
    /// - `SCRIBE_DEFAULT_SEASON`: default season (default: 2024)
    /// - `SCRIBE_STORYLINE_CAP`: storylines kept, 1-10 (default: 5)
    /// - `SCRIBE_STORYLINE_STRATEGY`: `rule_based` or `delegated` (default: delegated)
    /// - `SCRIBE_MIN_WORDS` / `SCRIBE_MAX_WORDS`: accepted article length (default: unchecked)
    /// - `SCRIBE_ALLOW_FALLBACK_ARTICLE`: publish a template article on generation failure (default: false)
    /// - `SCRIBE_MAX_CONCURRENT_REQUESTS`: upstream fan-out bound (default: 4)
    /// - `SCRIBE_CALL_TIMEOUT_SECS`: per-call deadline (default: 60)
    /// - `ENVIRONMENT`: development, staging or production (default: development)
    /// - `SCRIBE_HOST` / `SCRIBE_PORT`: bind address (default: 127.0.0.1:8000)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or have invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup. `from_env` uses the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Upstream APIs - both keys are required
        config.rapidapi_key = required(&lookup, "RAPIDAPI_KEY")?;
        config.llm_api_key = required(&lookup, "OPENAI_API_KEY")?;

        if let Some(val) = lookup("API_FOOTBALL_BASE_URL") {
            config.football_base_url = val;
        }

        if let Some(val) = lookup("OPENAI_API_BASE") {
            config.llm_api_base = val;
        }

        // Generation settings
        if let Some(val) = lookup("OPENAI_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("SCRIBE_TEMPERATURE") {
            config.temperature = parse_env_value(&val, "SCRIBE_TEMPERATURE")?;
        }

        if let Some(val) = lookup("SCRIBE_MAX_TOKENS") {
            config.max_tokens = parse_env_value(&val, "SCRIBE_MAX_TOKENS")?;
        }

        // Football defaults
        if let Some(val) = lookup("SCRIBE_DEFAULT_LEAGUE") {
            config.default_league = parse_env_value(&val, "SCRIBE_DEFAULT_LEAGUE")?;
        }

        if let Some(val) = lookup("SCRIBE_DEFAULT_SEASON") {
            config.default_season = parse_env_value(&val, "SCRIBE_DEFAULT_SEASON")?;
        }

        // Storylines and articles
        if let Some(val) = lookup("SCRIBE_STORYLINE_CAP") {
            config.storyline_cap = parse_env_value(&val, "SCRIBE_STORYLINE_CAP")?;
        }

        if let Some(val) = lookup("SCRIBE_STORYLINE_STRATEGY") {
            config.storyline_strategy =
                val.parse().map_err(|message| ConfigError::InvalidValue {
                    key: "SCRIBE_STORYLINE_STRATEGY".to_string(),
                    message,
                })?;
        }

        let min_words: Option<usize> = lookup("SCRIBE_MIN_WORDS")
            .map(|val| parse_env_value(&val, "SCRIBE_MIN_WORDS"))
            .transpose()?;
        let max_words: Option<usize> = lookup("SCRIBE_MAX_WORDS")
            .map(|val| parse_env_value(&val, "SCRIBE_MAX_WORDS"))
            .transpose()?;
        config.word_range = match (min_words, max_words) {
            (None, None) => None,
            (min, max) => Some(WordRange::new(min.unwrap_or(0), max.unwrap_or(usize::MAX))),
        };

        if let Some(val) = lookup("SCRIBE_ALLOW_FALLBACK_ARTICLE") {
            config.allow_fallback_article = parse_env_bool(&val, "SCRIBE_ALLOW_FALLBACK_ARTICLE")?;
        }

        // Concurrency and deadlines
        if let Some(val) = lookup("SCRIBE_MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests =
                parse_env_value(&val, "SCRIBE_MAX_CONCURRENT_REQUESTS")?;
        }

        if let Some(val) = lookup("SCRIBE_CALL_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "SCRIBE_CALL_TIMEOUT_SECS")?;
            config.call_timeout = Duration::from_secs(secs);
        }

        // Service
        if let Some(val) = lookup("ENVIRONMENT") {
            config.environment = val.parse().map_err(|message| ConfigError::InvalidValue {
                key: "ENVIRONMENT".to_string(),
                message,
            })?;
        }

        if let Some(val) = lookup("SCRIBE_HOST") {
            config.host = val;
        }

        if let Some(val) = lookup("SCRIBE_PORT") {
            config.port = parse_env_value(&val, "SCRIBE_PORT")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// Credentials are not checked here; `from_env` requires them and the
    /// API clients reject empty keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.football_base_url.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "football_base_url cannot be empty".to_string(),
            ));
        }

        if self.llm_api_base.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "llm_api_base cannot be empty".to_string(),
            ));
        }

        if self.model.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(1..=MAX_STORYLINE_CAP).contains(&self.storyline_cap) {
            return Err(ConfigError::ValidationFailed(format!(
                "storyline_cap must be between 1 and {}",
                MAX_STORYLINE_CAP
            )));
        }

        if let Some(range) = self.word_range {
            if range.min > range.max {
                return Err(ConfigError::ValidationFailed(
                    "word_range minimum cannot exceed maximum".to_string(),
                ));
            }
        }

        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_requests must be greater than 0".to_string(),
            ));
        }

        if self.call_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "call_timeout must be greater than 0".to_string(),
            ));
        }

        if self.host.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "host cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Collector settings derived from this configuration.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig::new()
            .with_max_concurrent_requests(self.max_concurrent_requests)
            .with_call_timeout(self.call_timeout)
            .with_default_league(self.default_league)
    }

    /// Research settings derived from this configuration.
    ///
    /// Only the strategy and cap are carried over. Storyline calls keep
    /// [`ResearcherConfig::default`]'s temperature and token limit, which
    /// are tuned for a short JSON list rather than a full article.
    pub fn researcher_config(&self) -> ResearcherConfig {
        ResearcherConfig::new()
            .with_strategy(self.storyline_strategy)
            .with_storyline_cap(self.storyline_cap)
    }

    /// Writer settings derived from this configuration.
    pub fn writer_config(&self) -> WriterConfig {
        let config = WriterConfig::new()
            .with_model(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        match self.word_range {
            Some(range) => config.with_word_range(range),
            None => config,
        }
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builder method to set API credentials.
    pub fn with_api_keys(
        mut self,
        rapidapi_key: impl Into<String>,
        llm_api_key: impl Into<String>,
    ) -> Self {
        self.rapidapi_key = rapidapi_key.into();
        self.llm_api_key = llm_api_key.into();
        self
    }

    /// Builder method to set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method to set temperature.
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    /// Builder method to set the default season.
    pub fn with_default_season(mut self, season: u32) -> Self {
        self.default_season = season;
        self
    }

    /// Builder method to set the storyline cap.
    pub fn with_storyline_cap(mut self, cap: usize) -> Self {
        self.storyline_cap = cap;
        self
    }

    /// Builder method to set the storyline strategy.
    pub fn with_storyline_strategy(mut self, strategy: StorylineStrategy) -> Self {
        self.storyline_strategy = strategy;
        self
    }

    /// Builder method to set the accepted article length.
    pub fn with_word_range(mut self, range: WordRange) -> Self {
        self.word_range = Some(range);
        self
    }

    /// Builder method to allow or forbid the fallback article.
    pub fn with_fallback_article(mut self, allowed: bool) -> Self {
        self.allow_fallback_article = allowed;
        self
    }

    /// Builder method to set the upstream fan-out bound.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Builder method to set the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Builder method to set the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|val| !val.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const KEYS: [(&str, &str); 2] = [("RAPIDAPI_KEY", "rapid"), ("OPENAI_API_KEY", "sk-test")];

    #[test]
    fn test_default_config() {
        let config = ScribeConfig::default();
        assert_eq!(config.model, "gpt-4-turbo");
        assert!((config.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.default_league, 39);
        assert_eq!(config.storyline_cap, 5);
        assert_eq!(config.storyline_strategy, StorylineStrategy::Delegated);
        assert!(config.word_range.is_none());
        assert!(!config.allow_fallback_article);
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.call_timeout, Duration::from_secs(60));
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_requires_keys() {
        let err = ScribeConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "RAPIDAPI_KEY"));

        let err = ScribeConfig::from_lookup(lookup_from(&[
            ("RAPIDAPI_KEY", "rapid"),
            ("OPENAI_API_KEY", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let mut pairs = KEYS.to_vec();
        pairs.extend([
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("SCRIBE_STORYLINE_CAP", "3"),
            ("SCRIBE_STORYLINE_STRATEGY", "rule_based"),
            ("SCRIBE_MIN_WORDS", "400"),
            ("SCRIBE_MAX_WORDS", "600"),
            ("SCRIBE_ALLOW_FALLBACK_ARTICLE", "yes"),
            ("SCRIBE_CALL_TIMEOUT_SECS", "15"),
            ("ENVIRONMENT", "production"),
            ("SCRIBE_PORT", "9000"),
        ]);
        let config = ScribeConfig::from_lookup(lookup_from(&pairs)).expect("valid config");

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.storyline_cap, 3);
        assert_eq!(config.storyline_strategy, StorylineStrategy::RuleBased);
        assert_eq!(config.word_range, Some(WordRange::new(400, 600)));
        assert!(config.allow_fallback_article);
        assert_eq!(config.call_timeout, Duration::from_secs(15));
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("SCRIBE_TEMPERATURE", "warm"));
        let err = ScribeConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SCRIBE_TEMPERATURE"));

        let mut pairs = KEYS.to_vec();
        pairs.push(("ENVIRONMENT", "qa"));
        assert!(ScribeConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = KEYS.to_vec();
        pairs.push(("SCRIBE_STORYLINE_CAP", "11"));
        let err = ScribeConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("storyline_cap"));
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            (ScribeConfig::default().with_temperature(3.0), "temperature"),
            (ScribeConfig::default().with_storyline_cap(0), "storyline_cap"),
            (ScribeConfig::default().with_max_concurrent_requests(0), "max_concurrent_requests"),
            (
                ScribeConfig::default().with_call_timeout(Duration::from_secs(0)),
                "call_timeout",
            ),
            (ScribeConfig::default().with_model(""), "model"),
            (
                ScribeConfig::default().with_word_range(WordRange::new(600, 400)),
                "word_range",
            ),
        ];

        for (config, field) in cases {
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(field), "{} not in {}", field, err);
        }
    }

    #[test]
    fn test_derived_agent_configs() {
        let config = ScribeConfig::default()
            .with_storyline_cap(3)
            .with_word_range(WordRange::new(400, 600))
            .with_max_concurrent_requests(2);

        assert_eq!(config.researcher_config().storyline_cap, 3);
        assert_eq!(config.writer_config().word_range, Some(WordRange::new(400, 600)));
        assert_eq!(config.writer_config().model, "gpt-4-turbo");
        assert_eq!(config.collector_config().max_concurrent_requests, 2);
    }

    #[test]
    fn test_sampling_settings_apply_to_the_writer_only() {
        let mut config = ScribeConfig::default();
        config.temperature = 1.1;
        config.max_tokens = 3500;

        let writer = config.writer_config();
        assert_eq!(writer.temperature, 1.1);
        assert_eq!(writer.max_tokens, 3500);

        let researcher = config.researcher_config();
        let defaults = ResearcherConfig::default();
        assert_eq!(researcher.temperature, defaults.temperature);
        assert_eq!(researcher.max_tokens, defaults.max_tokens);
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = ScribeConfig::default().with_api_keys("rapid-secret", "sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("rapid-secret"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("true", "test").unwrap());
        assert!(parse_env_bool("ON", "test").unwrap());
        assert!(!parse_env_bool("0", "test").unwrap());
        assert!(!parse_env_bool("no", "test").unwrap());
        assert!(parse_env_bool("maybe", "test").is_err());
    }
}
