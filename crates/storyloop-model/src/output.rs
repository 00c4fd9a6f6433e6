use serde::Serialize;
use std::time::Duration;

/// Text returned by a model call
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Wall-clock time of the call
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Output tokens reported by the backend, if any
    pub output_tokens: Option<u32>,
}

impl Completion {
    pub fn new(text: String, duration: Duration) -> Self {
        Self {
            text,
            duration,
            output_tokens: None,
        }
    }

    pub fn with_output_tokens(mut self, tokens: u32) -> Self {
        self.output_tokens = Some(tokens);
        self
    }

    /// Whether the backend returned only whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

mod duration_secs {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }
}
