//! Invocation configuration.
//!
//! Everything the issuer needs is carried in one [`InvocationConfig`] value
//! passed at call time. It can be loaded from YAML or JSON and every field
//! except `guardrail_id` has a default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default model identifier.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

/// Default guardrail version (the working draft).
pub const DEFAULT_GUARDRAIL_VERSION: &str = "DRAFT";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: &str = "30s";

/// Default environment variable holding the Bedrock API key.
pub const DEFAULT_API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Demo prompt: a new employee asks about vacation days. The answer carries
/// one checkable claim (15 days) plus details a policy may not cover.
pub const DEFAULT_PROMPT: &str = "\
I am a newly hired employee (less than 1 year with the company) and work \
full-time. How many vacation days can I take this year?

As a full-time employee with less than 1 year of service, you receive \
15 vacation days per year.

Vacation time is usually accrued over the course of the year, not given \
all at once upfront. So you may earn 1.25 vacation days per month worked \
(15 days / 12 months).

There may be a waiting period, like 90 days, before you can start using \
accrued vacation time as a new employee.

Usage of vacation days is often subject to manager approval based on \
factors like workload, staffing needs, etc.

Unused vacation days may or may not rollover to the next year depending \
on company policy. Some places have a \"use it or lose it\" policy.";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Configuration for one guarded model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationConfig {
    /// AWS region hosting the runtime endpoint
    #[serde(default = "default_region")]
    pub region: String,

    /// Model to invoke (ID or ARN)
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Guardrail identifier (required)
    #[serde(default)]
    pub guardrail_id: String,

    /// Guardrail version: "DRAFT" or a published version number
    #[serde(default = "default_guardrail_version")]
    pub guardrail_version: String,

    /// User prompt sent as the single message
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Endpoint override (defaults to the regional runtime endpoint)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout, human-readable (e.g. "30s", "2m")
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_guardrail_version() -> String {
    DEFAULT_GUARDRAIL_VERSION.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            model_id: default_model_id(),
            guardrail_id: String::new(),
            guardrail_version: default_guardrail_version(),
            prompt: default_prompt(),
            endpoint: None,
            timeout: default_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl InvocationConfig {
    /// Create a config for the given guardrail with defaults elsewhere.
    pub fn new(guardrail_id: impl Into<String>) -> Self {
        Self {
            guardrail_id: guardrail_id.into(),
            ..Default::default()
        }
    }

    /// Parse a config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file. `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Parsed request timeout.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        let timeout =
            humantime::parse_duration(&self.timeout).map_err(|e| ConfigError::InvalidField {
                field: "timeout",
                reason: e.to_string(),
            })?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(timeout)
    }

    /// Base URL of the runtime endpoint.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => regional_endpoint(&self.region),
        }
    }

    /// Validate the config structure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingField("region"));
        }
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::MissingField("model_id"));
        }
        if self.guardrail_id.trim().is_empty() {
            return Err(ConfigError::MissingField("guardrail_id"));
        }
        if self.prompt.trim().is_empty() {
            return Err(ConfigError::MissingField("prompt"));
        }

        let version = self.guardrail_version.as_str();
        let numbered = version.parse::<u32>().map(|v| v > 0).unwrap_or(false);
        if version != DEFAULT_GUARDRAIL_VERSION && !numbered {
            return Err(ConfigError::InvalidField {
                field: "guardrail_version",
                reason: format!("expected DRAFT or a positive version number, got '{}'", version),
            });
        }

        if let Some(url) = &self.endpoint {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidField {
                    field: "endpoint",
                    reason: "must start with http:// or https://".to_string(),
                });
            }
        }

        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::MissingField("api_key_env"));
        }

        self.timeout()?;
        Ok(())
    }
}

/// Runtime endpoint for a region.
pub fn regional_endpoint(region: &str) -> String {
    format!("https://bedrock-runtime.{}.amazonaws.com", region)
}
