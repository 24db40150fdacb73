//! Configuration for the snapshot pipeline

use crate::error::{LensError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://financialmodelingprep.com/api";
const DEFAULT_MODEL: &str = "gpt-4o";
const MIN_PROMPT_BUDGET: usize = 512;

/// Configuration for one pipeline instance
///
/// Holds the market-data credential and every tunable the pipeline reads.
/// Constructed once and passed into the fetcher and engine explicitly; no
/// component reads configuration from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensConfig {
    /// Market-data API key (required)
    pub fmp_api_key: String,

    /// Market-data API base URL
    pub api_base: String,

    /// Completion model identifier
    pub model: String,

    /// Timeout applied to each market-data request
    pub fetch_timeout: Duration,

    /// Timeout applied to the completion call
    pub completion_timeout: Duration,

    /// Upper bound on concurrently in-flight market-data requests
    pub max_concurrent_fetches: usize,

    /// Market-data requests allowed per minute
    pub rate_limit_per_minute: u32,

    /// Maximum size of the rendered narrative prompt, in characters
    pub prompt_char_budget: usize,

    /// Maximum tokens requested from the completion service
    pub max_completion_tokens: usize,

    /// Completion sampling temperature
    pub temperature: f32,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            fmp_api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            fetch_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(30),
            max_concurrent_fetches: 4,
            rate_limit_per_minute: 250,
            prompt_char_budget: 4000,
            max_completion_tokens: 1024,
            temperature: 0.2,
        }
    }
}

impl LensConfig {
    /// Create a new configuration builder
    pub fn builder() -> LensConfigBuilder {
        LensConfigBuilder::default()
    }

    /// Load configuration from the environment
    ///
    /// `FMP_API_KEY` is required; `FMP_API_BASE` and `STOCKLENS_MODEL`
    /// override their defaults when set.
    pub fn from_env() -> Result<Self> {
        let fmp_api_key = std::env::var("FMP_API_KEY").map_err(|_| {
            LensError::Configuration("FMP_API_KEY environment variable not set".to_string())
        })?;

        let mut config = Self {
            fmp_api_key,
            ..Self::default()
        };

        if let Ok(base) = std::env::var("FMP_API_BASE") {
            config.api_base = base;
        }
        if let Ok(model) = std::env::var("STOCKLENS_MODEL") {
            config.model = model;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Missing credentials are fatal before any network call is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.fmp_api_key.trim().is_empty() {
            return Err(LensError::Configuration(
                "market-data API key is missing".to_string(),
            ));
        }

        if self.max_concurrent_fetches == 0 {
            return Err(LensError::Configuration(
                "max_concurrent_fetches must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(LensError::Configuration(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.prompt_char_budget < MIN_PROMPT_BUDGET {
            return Err(LensError::Configuration(format!(
                "prompt_char_budget must be at least {MIN_PROMPT_BUDGET} characters"
            )));
        }

        Ok(())
    }
}

/// Builder for LensConfig
#[derive(Debug, Default)]
pub struct LensConfigBuilder {
    fmp_api_key: Option<String>,
    api_base: Option<String>,
    model: Option<String>,
    fetch_timeout: Option<Duration>,
    completion_timeout: Option<Duration>,
    max_concurrent_fetches: Option<usize>,
    rate_limit_per_minute: Option<u32>,
    prompt_char_budget: Option<usize>,
    max_completion_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl LensConfigBuilder {
    /// Set the market-data API key
    pub fn fmp_api_key(mut self, key: impl Into<String>) -> Self {
        self.fmp_api_key = Some(key.into());
        self
    }

    /// Set the market-data API base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the completion model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the per-request fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Set the completion call timeout
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }

    /// Set the concurrent fetch bound
    pub fn max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = Some(limit);
        self
    }

    /// Set the market-data rate limit
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set the narrative prompt character budget
    pub fn prompt_char_budget(mut self, budget: usize) -> Self {
        self.prompt_char_budget = Some(budget);
        self
    }

    /// Set the completion token limit
    pub fn max_completion_tokens(mut self, tokens: usize) -> Self {
        self.max_completion_tokens = Some(tokens);
        self
    }

    /// Set the completion temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<LensConfig> {
        let defaults = LensConfig::default();

        let config = LensConfig {
            fmp_api_key: self.fmp_api_key.unwrap_or(defaults.fmp_api_key),
            api_base: self.api_base.unwrap_or(defaults.api_base),
            model: self.model.unwrap_or(defaults.model),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            completion_timeout: self
                .completion_timeout
                .unwrap_or(defaults.completion_timeout),
            max_concurrent_fetches: self
                .max_concurrent_fetches
                .unwrap_or(defaults.max_concurrent_fetches),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            prompt_char_budget: self.prompt_char_budget.unwrap_or(defaults.prompt_char_budget),
            max_completion_tokens: self
                .max_completion_tokens
                .unwrap_or(defaults.max_completion_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_requires_key() {
        let config = LensConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = LensConfig::builder()
            .fmp_api_key("test_key")
            .fetch_timeout(Duration::from_secs(5))
            .prompt_char_budget(2000)
            .build()
            .unwrap();

        assert_eq!(config.fmp_api_key, "test_key");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.prompt_char_budget, 2000);
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let config = LensConfig {
            fmp_api_key: "test_key".to_string(),
            max_concurrent_fetches: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_tiny_budget() {
        let result = LensConfig::builder()
            .fmp_api_key("test_key")
            .prompt_char_budget(100)
            .build();

        assert!(result.is_err());
    }
}
