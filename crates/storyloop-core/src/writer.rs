use storyloop_model::{Model, ModelError, Sampling};
use tracing::{debug, warn};

use crate::{Story, StoryPrompts, StoryRequest};

/// Writing favors variety so retries explore different drafts
pub const DEFAULT_WRITER_SAMPLING: Sampling = Sampling::new(3000, 0.9);

/// Writer that drafts stories with a model
pub struct StoryWriter<'a> {
    model: &'a dyn Model,
    sampling: Sampling,
}

impl<'a> StoryWriter<'a> {
    pub fn new(model: &'a dyn Model) -> Self {
        Self {
            model,
            sampling: DEFAULT_WRITER_SAMPLING,
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Draft a story, addressing `feedback` when given
    pub async fn write(
        &self,
        request: &StoryRequest,
        feedback: Option<&str>,
    ) -> Result<Story, ModelError> {
        let prompt = StoryPrompts::build_story_prompt(request.as_str(), feedback);

        debug!(
            prompt_len = prompt.len(),
            with_feedback = feedback.is_some(),
            "Running story writer"
        );

        let completion = self
            .model
            .complete(&prompt, self.sampling.max_tokens, self.sampling.temperature)
            .await?;

        if completion.is_blank() {
            warn!("Writer returned an empty story");
        }

        Ok(Story::new(completion.text.trim()))
    }
}
