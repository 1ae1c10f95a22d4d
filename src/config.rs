use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::investigation::{relevance, suggest};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WatsonConfig {
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub analysis: AnalysisConfig,
    pub case: CaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OracleConfig {
    /// `none`, `anthropic` or `openai`.
    pub provider: String,
    pub model: String,
    /// Defaults per provider when unset.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Literal key; takes precedence over `api_key_env`. Usually set via
    /// `WATSON_ORACLE_API_KEY` rather than in the file.
    pub api_key: Option<String>,
    pub max_tokens: u32,
    /// One HTTP attempt. Keep it well under `analysis.oracle_timeout_secs` so a
    /// timed-out attempt can still be retried inside the per-call ceiling.
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub candidate_threshold: f64,
    pub max_candidates: usize,
    pub max_judgments_per_turn: usize,
    pub max_suggestions: usize,
    /// Statements on record before the oracle is asked for suggestions.
    pub oracle_suggestion_min_statements: usize,
    /// Per-call ceiling, on top of the HTTP client's own timeout.
    pub oracle_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CaseConfig {
    /// TOML case file; the built-in case is used when unset.
    pub path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: "none".into(),
            model: "claude-sonnet-4-5".into(),
            api_base: None,
            api_key_env: "ANTHROPIC_API_KEY".into(),
            api_key: None,
            max_tokens: 1024,
            request_timeout_secs: 8,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            candidate_threshold: relevance::DEFAULT_THRESHOLD,
            max_candidates: relevance::DEFAULT_MAX_CANDIDATES,
            max_judgments_per_turn: 5,
            max_suggestions: suggest::DEFAULT_MAX_SUGGESTIONS,
            oracle_suggestion_min_statements: 3,
            oracle_timeout_secs: 20,
        }
    }
}

impl AnalysisConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

impl OracleConfig {
    /// The configured key, or the one found in `api_key_env`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn resolved_api_base(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None if self.provider == "openai" => "https://api.openai.com/v1".into(),
            None => "https://api.anthropic.com".into(),
        }
    }
}

/// Returns `~/.watson/`, or `./.watson` when there is no home directory.
pub fn default_watson_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".watson")
}

/// Returns the default config file path: `~/.watson/config.toml`
pub fn default_config_path() -> PathBuf {
    default_watson_dir().join("config.toml")
}

impl WatsonConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            WatsonConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (WATSON_LOG_LEVEL, WATSON_ORACLE_PROVIDER,
    /// WATSON_ORACLE_MODEL, WATSON_ORACLE_API_KEY, WATSON_CASE).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("WATSON_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("WATSON_ORACLE_PROVIDER") {
            self.oracle.provider = val;
        }
        if let Ok(val) = std::env::var("WATSON_ORACLE_MODEL") {
            self.oracle.model = val;
        }
        if let Ok(val) = std::env::var("WATSON_ORACLE_API_KEY") {
            self.oracle.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("WATSON_CASE") {
            self.case.path = Some(val);
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
