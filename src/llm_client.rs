// src/llm_client.rs
//! Client for OpenAI-compatible chat completion endpoints (DeepSeek, OpenAI, ...).

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Request error: {0}")]
    Request(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("No content in model response")]
    EmptyResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Anything that can answer a list of chat messages with text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
            max_tokens: 1024,
        };

        tracing::debug!("LLM request: model={}, messages={}", self.model, messages.len());

        let backoff_config = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        // Connection errors, timeouts, 429 and 5xx are retried
        let operation = || async {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .timeout(Duration::from_secs(60))
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        tracing::warn!("LLM connection error (retrying): {}", e);
                        backoff::Error::transient(LlmError::Request(e.to_string()))
                    } else {
                        tracing::error!("LLM request error: {}", e);
                        backoff::Error::permanent(LlmError::Request(e.to_string()))
                    }
                })?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| backoff::Error::permanent(LlmError::Request(e.to_string())))?;

            if status.as_u16() == 429 || status.is_server_error() {
                tracing::warn!("LLM API returned {} (retrying)", status);
                return Err(backoff::Error::transient(LlmError::Api {
                    status: status.as_u16(),
                    body,
                }));
            }

            if !status.is_success() {
                tracing::error!("LLM API permanent error ({}): {}", status, body);
                return Err(backoff::Error::permanent(LlmError::Api {
                    status: status.as_u16(),
                    body,
                }));
            }

            serde_json::from_str::<ChatCompletionResponse>(&body)
                .map_err(|e| backoff::Error::permanent(LlmError::Parse(e.to_string())))
        };

        let parsed = retry(backoff_config, operation).await?;

        if let Some(usage) = &parsed.usage {
            tracing::info!(
                "LLM usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.chat_completion(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "deepseek-chat",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 16,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_response_parsing_tolerates_missing_usage() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"SELECT 1"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = LlmClient::new(&LlmConfig {
            api_key: "k".to_string(),
            base_url: "https://api.deepseek.com/v1/".to_string(),
            model: "deepseek-chat".to_string(),
        });
        assert_eq!(client.base_url, "https://api.deepseek.com/v1");
        assert_eq!(client.model(), "deepseek-chat");
    }
}
