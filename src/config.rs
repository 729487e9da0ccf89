//! Client configuration.
//!
//! [`ClientConfig`] is built once at startup and handed to
//! [`SearchClient::new`](crate::client::SearchClient::new). Values come from
//! defaults, then a `.env` file, then the process environment; the binary
//! applies command line overrides on top.

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::errors::SearchError;

pub const ENV_BASE_URL: &str = "SEARXNG_URL";
pub const ENV_TIMEOUT: &str = "SEARXNG_TIMEOUT";
pub const ENV_MAX_RESULTS: &str = "SEARXNG_MAX_RESULTS";
pub const ENV_AI_ENABLED: &str = "AI_ENHANCEMENT_ENABLED";
pub const ENV_AI_ENDPOINT: &str = "AI_ENHANCER_URL";
pub const ENV_AI_DELAY: &str = "AI_SIMULATED_DELAY_MS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Root of the SearXNG instance, without a trailing slash.
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Keep at most this many results per search. `None` keeps everything.
    pub max_results: Option<usize>,
    pub ai_enhancement: bool,
    /// Remote enhancement service. Only consulted when `ai_enhancement` is on.
    pub ai_endpoint: Option<String>,
    /// Latency injected by the simulated enhancer when no endpoint is set.
    pub ai_simulated_delay_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888".to_string(),
            timeout_seconds: 30,
            max_results: None,
            ai_enhancement: false,
            ai_endpoint: None,
            ai_simulated_delay_ms: 800,
            user_agent: format!("searxng-assistant/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, SearchError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Read configuration from a specific dotenv file, ignoring the process
    /// environment.
    pub fn from_env_file(path: &Path) -> Result<Self, SearchError> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            SearchError::invalid_config("env_file", format!("{}: {}", path.display(), e))
        })?;

        let mut vars = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                SearchError::invalid_config("env_file", format!("{}: {}", path.display(), e))
            })?;
            vars.push((key, value));
        }

        Self::from_vars(vars)
    }

    /// Build a config from key/value pairs. Unknown keys are ignored and
    /// missing keys keep their defaults.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let value = value.as_ref().trim();
            match key.as_ref() {
                ENV_BASE_URL => config.base_url = value.trim_end_matches('/').to_string(),
                ENV_TIMEOUT => config.timeout_seconds = parse_number(ENV_TIMEOUT, value)?,
                ENV_MAX_RESULTS => {
                    config.max_results = if value.is_empty() {
                        None
                    } else {
                        Some(parse_number(ENV_MAX_RESULTS, value)?)
                    }
                }
                ENV_AI_ENABLED => config.ai_enhancement = parse_flag(ENV_AI_ENABLED, value)?,
                ENV_AI_ENDPOINT => {
                    config.ai_endpoint = if value.is_empty() {
                        None
                    } else {
                        Some(value.trim_end_matches('/').to_string())
                    }
                }
                ENV_AI_DELAY => config.ai_simulated_delay_ms = parse_number(ENV_AI_DELAY, value)?,
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SearchError::invalid_config(
                "base_url",
                "must start with http:// or https://",
            ));
        }
        Url::parse(&self.base_url)
            .map_err(|e| SearchError::invalid_config("base_url", e.to_string()))?;

        if self.timeout_seconds == 0 {
            return Err(SearchError::invalid_config(
                "timeout_seconds",
                "must be greater than 0",
            ));
        }

        if self.max_results == Some(0) {
            return Err(SearchError::invalid_config(
                "max_results",
                "must be greater than 0",
            ));
        }

        if let Some(endpoint) = &self.ai_endpoint {
            Url::parse(endpoint)
                .map_err(|e| SearchError::invalid_config("ai_endpoint", e.to_string()))?;
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SearchError> {
    value
        .parse::<T>()
        .map_err(|_| SearchError::invalid_config(key, format!("expected a number, got '{}'", value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, SearchError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SearchError::invalid_config(
            key,
            format!("expected a boolean, got '{}'", value),
        )),
    }
}
