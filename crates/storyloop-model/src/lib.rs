mod anthropic;
mod http;
mod openai;
mod output;
mod traits;

pub use anthropic::AnthropicModel;
pub use openai::OpenAiModel;
pub use output::Completion;
pub use traits::{Model, ModelConfig, ModelError, ModelKind, Sampling};

/// Create a model backend by kind
pub fn create_model(kind: ModelKind, config: &ModelConfig) -> Result<Box<dyn Model>, ModelError> {
    match kind {
        ModelKind::OpenAi => Ok(Box::new(OpenAiModel::new(config)?)),
        ModelKind::Anthropic => Ok(Box::new(AnthropicModel::new(config)?)),
    }
}
