use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "x-ai/grok-4.1-fast:free";

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl AiConfig {
    /// Read `KTET_AI_API_KEY`, `KTET_AI_BASE_URL` and `KTET_AI_MODEL`.
    ///
    /// Returns `None` when no API key is set, which disables the AI features.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("KTET_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("KTET_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("KTET_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// One message of a chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Minimal OpenAI-compatible chat completion client.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: Option<AiConfig>,
}

impl ChatClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(AiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<AiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send one chat completion and return the first choice's trimmed text.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the client is disabled, the request fails or
    /// times out, or the response carries no content.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
        timeout: Option<Duration>,
    ) -> Result<String, AiError> {
        let config = self.config.as_ref().ok_or(AiError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: &config.model,
            messages,
            temperature,
        };

        let mut request = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(map_send_error)?;
        if !response.status().is_success() {
            tracing::warn!("chat completion failed with status {}", response.status());
            return Err(AiError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await.map_err(map_send_error)?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

fn map_send_error(err: reqwest::Error) -> AiError {
    if err.is_timeout() {
        AiError::Timeout
    } else {
        AiError::Http(err)
    }
}

/// Remove markdown code fences a model may wrap around its answer.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the language tag line
        text = rest.split_once('\n').map_or("", |(_, body)| body);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_with_language_tag() {
        let raw = "```json\n{\"questions\": []}\n```";
        assert_eq!(strip_code_fences(raw), "{\"questions\": []}");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  <p>hi</p> "), "<p>hi</p>");
    }

    #[tokio::test]
    async fn disabled_client_refuses_requests() {
        let client = ChatClient::new(None);
        assert!(!client.enabled());
        let err = client
            .complete(vec![ChatMessage::user("hello")], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Disabled));
    }
}
