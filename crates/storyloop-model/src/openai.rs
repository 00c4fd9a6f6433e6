use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::http::{build_client, resolve_api_key, status_error};
use crate::{Completion, Model, ModelConfig, ModelError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// OpenAI Chat Completions backend
pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = resolve_api_key(config, API_KEY_VAR)?;
        let base_url = config
            .base_url
            .clone()
            .or_else(|| std::env::var(BASE_URL_VAR).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client: build_client(config)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
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
struct ChatUsage {
    completion_tokens: u32,
}

impl ChatResponse {
    fn into_completion(self, start: Instant) -> Result<Completion, ModelError> {
        let tokens = self.usage.map(|u| u.completion_tokens);
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::Response("response contained no message content".into()))?;

        let completion = Completion::new(text, start.elapsed());
        Ok(match tokens {
            Some(t) => completion.with_output_tokens(t),
            None => completion,
        })
    }
}

#[async_trait]
impl Model for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
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
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Response(e.to_string()))?;

        let completion = parsed.into_completion(start)?;
        debug!(
            duration_ms = completion.duration.as_millis(),
            chars = completion.text.len(),
            "Model call completed"
        );
        Ok(completion)
    }
}
