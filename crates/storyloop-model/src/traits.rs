use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::Completion;

/// Errors that can occur while calling a model backend
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("Model configuration error: {0}")]
    Config(String),
}

impl ModelError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ModelError::Auth(_))
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ModelError::Response(e.to_string())
        } else {
            ModelError::Transport(e.to_string())
        }
    }
}

/// Connection settings for a model backend
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier (backend default when None)
    pub model: Option<String>,
    /// Override for the API base URL
    pub base_url: Option<String>,
    /// API key (read from the backend's environment variable when None)
    pub api_key: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl ModelConfig {
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }
}

/// Sampling parameters for one model call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Sampling {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    OpenAi,
    Anthropic,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::OpenAi => write!(f, "openai"),
            ModelKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open-ai" | "gpt" => Ok(ModelKind::OpenAi),
            "anthropic" | "claude" => Ok(ModelKind::Anthropic),
            _ => Err(format!("Unknown model backend: {}", s)),
        }
    }
}

/// A text-generation capability: prompt in, text out.
///
/// Implementations own their transport, credentials and timeouts. A call
/// either yields the complete text or fails; nothing partial is exposed.
#[async_trait]
pub trait Model: Send + Sync {
    /// Human-readable name of the backend (e.g., "OpenAI")
    fn name(&self) -> &str;

    /// Model identifier sent to the backend
    fn model_id(&self) -> &str;

    /// Complete a single-turn prompt
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Completion, ModelError>;
}
