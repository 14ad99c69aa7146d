//! Configuration management utilities
//!
//! [`Settings`] carries the knobs shared by the agent loop and the batch
//! runner. Values come from defaults, a JSON document, or `AGENT_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable names read by [`Settings::from_env`]
pub mod env {
    /// Deployment environment (dev, prod, etc.)
    pub const ENVIRONMENT: &str = "AGENT_ENV";
    /// Model identifier
    pub const MODEL: &str = "AGENT_MODEL";
    /// Iteration budget per run
    pub const MAX_ITERATIONS: &str = "AGENT_MAX_ITERATIONS";
    /// Max tokens per completion
    pub const MAX_TOKENS: &str = "AGENT_MAX_TOKENS";
    /// Sampling temperature
    pub const TEMPERATURE: &str = "AGENT_TEMPERATURE";
    /// Tool calls in flight per turn
    pub const TOOL_CONCURRENCY: &str = "AGENT_TOOL_CONCURRENCY";
    /// Agent runs in flight per batch
    pub const BATCH_CONCURRENCY: &str = "AGENT_BATCH_CONCURRENCY";
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
    },

    /// A JSON settings document could not be parsed
    #[error("Invalid settings document: {0}")]
    InvalidDocument(String),

    /// Parsed settings are out of range
    #[error("Invalid settings: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Model identifier passed to the model client
    pub model: String,
    /// Maximum reasoning iterations per run
    pub max_iterations: usize,
    /// Max tokens per completion
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Tool calls in flight when one turn requests several
    pub tool_concurrency: usize,
    /// Agent runs in flight in a batch
    pub batch_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "agent-rs".to_string(),
            environment: "development".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_iterations: 10,
            max_tokens: 4096,
            temperature: 0.7,
            tool_concurrency: 5,
            batch_concurrency: 5,
        }
    }
}

impl Settings {
    /// Load settings from `AGENT_*` environment variables over the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup over the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(environment) = lookup(env::ENVIRONMENT) {
            settings.environment = environment;
        }
        if let Some(model) = lookup(env::MODEL) {
            settings.model = model;
        }
        if let Some(v) = parse(&lookup, env::MAX_ITERATIONS)? {
            settings.max_iterations = v;
        }
        if let Some(v) = parse(&lookup, env::MAX_TOKENS)? {
            settings.max_tokens = v;
        }
        if let Some(v) = parse(&lookup, env::TEMPERATURE)? {
            settings.temperature = v;
        }
        if let Some(v) = parse(&lookup, env::TOOL_CONCURRENCY)? {
            settings.tool_concurrency = v;
        }
        if let Some(v) = parse(&lookup, env::BATCH_CONCURRENCY)? {
            settings.batch_concurrency = v;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a JSON document; missing fields take defaults
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(document)
            .map_err(|e| ConfigError::InvalidDocument(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.tool_concurrency == 0 || self.batch_concurrency == 0 {
            return Err(ConfigError::Validation(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
