//! Configuration schema (descrefly.toml)

use serde::{Deserialize, Serialize};

/// Default upper bound for a telemetry delivery attempt
pub const DEFAULT_TELEMETRY_TIMEOUT_MS: u64 = 2_000;

/// Environment variable that turns telemetry off regardless of config
pub const DISABLE_TRACKING_ENV: &str = "DESCREFLY_DISABLE_TRACKING";

fn default_timeout_ms() -> u64 {
    DEFAULT_TELEMETRY_TIMEOUT_MS
}

/// Telemetry (hook usage tracking) configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Never send hook events
    #[serde(default)]
    pub disabled: bool,

    /// Collector URL events are POSTed to. Nothing is sent when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Upper bound for one delivery attempt, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            endpoint: None,
            timeout_ms: DEFAULT_TELEMETRY_TIMEOUT_MS,
        }
    }
}

impl TelemetryConfig {
    /// Whether an `DESCREFLY_DISABLE_TRACKING` value opts out of tracking
    pub fn env_opts_out(value: Option<&str>) -> bool {
        match value.map(str::trim) {
            None | Some("") => false,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"),
        }
    }

    /// Endpoint to send events to, if tracking is enabled at all
    pub fn active_endpoint(&self, env_value: Option<&str>) -> Option<&str> {
        if self.disabled || Self::env_opts_out(env_value) {
            return None;
        }
        self.endpoint.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Allowlist rules for specific models or patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistRules {
    /// Models that never need a description (glob patterns on model file names)
    #[serde(default)]
    pub skip_models: Vec<String>,
}

impl AllowlistRules {
    /// Check if a model matches any pattern in the list
    fn matches_pattern(model: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, model)
            } else {
                pattern == model
            }
        })
    }

    /// Check if a model should be skipped
    pub fn is_model_skipped(&self, model: &str) -> bool {
        Self::matches_pattern(model, &self.skip_models)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Telemetry settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Allowlist rules
    #[serde(default)]
    pub allowlist: AllowlistRules,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Glob matching where `*` matches any run of characters
fn glob_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let [first, middle @ .., last] = segments.as_slice() else {
        return pattern == text;
    };

    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last) {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for segment in middle {
        match rest.find(segment) {
            Some(at) => rest = &rest[at + segment.len()..],
            None => return false,
        }
    }
    true
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
