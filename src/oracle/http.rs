use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Oracle, OracleError};
use crate::config::OracleConfig;

const MAX_BACKOFF: Duration = Duration::from_secs(10);
const SYSTEM_PROMPT: &str = "You are Dr. Watson, a careful and observant assistant to a detective. \
     Be concise. When asked for JSON, reply with JSON only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Anthropic,
    OpenAi,
}

/// Oracle backed by a hosted chat model.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    api: Api,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
    backoff_base: Duration,
}

/// Delay before retry number `attempt` (0-based): base * 2^attempt, capped.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_BACKOFF)
}

impl HttpOracle {
    pub fn new(config: &OracleConfig, api_key: impl Into<String>) -> Result<Self> {
        let api = if config.provider == "openai" {
            Api::OpenAi
        } else {
            Api::Anthropic
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api,
            api_key: api_key.into(),
            api_base: config.resolved_api_base(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        })
    }

    async fn send_once(&self, prompt: &str) -> Result<String, OracleError> {
        let request = match self.api {
            Api::Anthropic => self
                .client
                .post(format!("{}/v1/messages", self.api_base))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&MessagesRequest {
                    model: &self.model,
                    system: SYSTEM_PROMPT,
                    max_tokens: self.max_tokens,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                }),
            Api::OpenAi => self
                .client
                .post(format!("{}/chat/completions", self.api_base))
                .bearer_auth(&self.api_key)
                .json(&ChatRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: SYSTEM_PROMPT,
                        },
                        ChatMessage {
                            role: "user",
                            content: prompt,
                        },
                    ],
                }),
        };

        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(OracleError::Timeout),
            Err(e) => return Err(OracleError::Unavailable(e.to_string())),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| text.chars().take(200).collect());
            return Err(OracleError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = match self.api {
            Api::Anthropic => {
                let body: MessagesResponse =
                    resp.json().await.map_err(|_| OracleError::Unparseable)?;
                body.content
                    .into_iter()
                    .filter_map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Api::OpenAi => {
                let body: ChatResponse = resp.json().await.map_err(|_| OracleError::Unparseable)?;
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or(OracleError::Unparseable)?
            }
        };
        debug!(chars = text.len(), "oracle replied");
        Ok(text)
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn summarize(&self, prompt: &str) -> Result<String, OracleError> {
        let mut attempt = 0;
        loop {
            match self.send_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(self.backoff_base, attempt);
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "retrying oracle call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 10), MAX_BACKOFF);
    }

    #[test]
    fn provider_selects_api() {
        let mut config = OracleConfig::default();
        config.provider = "openai".into();
        let oracle = HttpOracle::new(&config, "k").unwrap();
        assert_eq!(oracle.api, Api::OpenAi);
        assert_eq!(oracle.api_base, "https://api.openai.com/v1");

        config.provider = "anthropic".into();
        config.api_base = Some("http://localhost:9999/".into());
        let oracle = HttpOracle::new(&config, "k").unwrap();
        assert_eq!(oracle.api, Api::Anthropic);
        assert_eq!(oracle.api_base, "http://localhost:9999");
    }

    #[test]
    fn request_shapes() {
        let req = MessagesRequest {
            model: "m",
            system: "s",
            max_tokens: 16,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "m",
                "system": "s",
                "max_tokens": 16,
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }
}
