//! The semantic-judgment oracle.
//!
//! The engine never depends on a concrete model: everything goes through the
//! [`Oracle`] trait. [`HttpOracle`] talks to a hosted LLM, [`DisabledOracle`]
//! refuses every call so the engine runs purely rule-based. Tests supply their
//! own implementations.

pub mod http;
pub mod json;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::OracleConfig;
use crate::investigation::contradiction::{ContradictionVerdict, JudgmentRequest};
pub use http::HttpOracle;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle is disabled")]
    Disabled,
    #[error("oracle call timed out")]
    Timeout,
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle http error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("oracle reply could not be parsed")]
    Unparseable,
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Unavailable(_) => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Disabled | Self::Unparseable => false,
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Free-form completion for a prompt.
    async fn summarize(&self, prompt: &str) -> Result<String, OracleError>;

    /// Judge whether two statements contradict each other.
    async fn judge_contradiction(
        &self,
        request: &JudgmentRequest,
    ) -> Result<ContradictionVerdict, OracleError> {
        let reply = self.summarize(&request.to_prompt()).await?;
        json::parse_first(&reply).ok_or(OracleError::Unparseable)
    }
}

/// Runs without an oracle: every call fails fast with [`OracleError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOracle;

#[async_trait]
impl Oracle for DisabledOracle {
    async fn summarize(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }

    async fn judge_contradiction(
        &self,
        _request: &JudgmentRequest,
    ) -> Result<ContradictionVerdict, OracleError> {
        Err(OracleError::Disabled)
    }
}

/// Build the oracle described by the config.
pub fn create_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>> {
    match config.provider.as_str() {
        "none" | "" => {
            info!("oracle disabled, running rule-based only");
            Ok(Arc::new(DisabledOracle))
        }
        "anthropic" | "openai" => {
            let Some(api_key) = config.resolved_api_key() else {
                bail!(
                    "oracle provider {} needs an API key (set {} or WATSON_ORACLE_API_KEY)",
                    config.provider,
                    config.api_key_env
                );
            };
            info!(provider = %config.provider, model = %config.model, "oracle configured");
            Ok(Arc::new(HttpOracle::new(config, api_key)?))
        }
        other => bail!("unknown oracle provider: {other}"),
    }
}

/// Run an oracle future under a deadline. A timeout is reported as
/// [`OracleError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, OracleError>
where
    F: std::future::Future<Output = Result<T, OracleError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(limit_ms = limit.as_millis() as u64, "oracle call timed out");
            Err(OracleError::Timeout)
        }
    }
}
