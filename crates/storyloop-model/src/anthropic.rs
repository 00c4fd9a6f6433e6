use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::http::{build_client, resolve_api_key, status_error};
use crate::{Completion, Model, ModelConfig, ModelError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Anthropic Messages API backend
pub struct AnthropicModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicModel {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        Ok(Self {
            client: build_client(config)?,
            api_key: resolve_api_key(config, API_KEY_VAR)?,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn build_headers(&self) -> Result<HeaderMap, ModelError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| ModelError::Auth("API key is not a valid header value".into()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    output_tokens: u32,
}

impl MessagesResponse {
    fn into_completion(self, start: Instant) -> Result<Completion, ModelError> {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(ModelError::Response(
                "response contained no text blocks".into(),
            ));
        }

        let completion = Completion::new(text, start.elapsed());
        Ok(match self.usage {
            Some(u) => completion.with_output_tokens(u.output_tokens),
            None => completion,
        })
    }
}

#[async_trait]
impl Model for AnthropicModel {
    fn name(&self) -> &str {
        "Anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Completion, ModelError> {
        debug!(
            backend = self.name(),
            model = %self.model,
            prompt_len = prompt.len(),
            max_tokens,
            temperature,
            "Calling model"
        );

        let start = Instant::now();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            // Anthropic caps temperature at 1.0
            temperature: temperature.clamp(0.0, 1.0),
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Response(e.to_string()))?;

        parsed.into_completion(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_blocks_are_joined() {
        let raw = r#"{"content":[{"type":"text","text":"Once upon "},{"type":"thinking","thinking":"..."},{"type":"text","text":"a time"}],"usage":{"input_tokens":5,"output_tokens":7}}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let completion = parsed.into_completion(Instant::now()).unwrap();
        assert_eq!(completion.text, "Once upon a time");
        assert_eq!(completion.output_tokens, Some(7));
    }

    #[test]
    fn test_no_text_is_error() {
        let raw = r#"{"content":[]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.into_completion(Instant::now()).is_err());
    }

    #[test]
    fn test_headers_carry_key_and_version() {
        let config = ModelConfig::default().with_api_key("sk-ant-test".into());
        let model = AnthropicModel::new(&config).unwrap();
        let headers = model.build_headers().unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant-test");
        assert_eq!(headers["anthropic-version"], API_VERSION);
    }
}
