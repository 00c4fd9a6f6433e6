use storyloop_model::{Model, ModelError, Sampling};
use tracing::{debug, info};

use crate::{Evaluation, JudgePrompts};

/// Scoring favors consistency over variety
pub const DEFAULT_JUDGE_SAMPLING: Sampling = Sampling::new(3000, 0.1);

/// Inputs required to judge one story.
#[derive(Clone, Copy)]
pub struct JudgeInput<'a> {
    pub request: &'a str,
    pub story: &'a str,
    pub iteration: usize,
}

/// Judge that scores stories with a model
pub struct StoryJudge<'a> {
    model: &'a dyn Model,
    sampling: Sampling,
}

impl<'a> StoryJudge<'a> {
    pub fn new(model: &'a dyn Model) -> Self {
        Self {
            model,
            sampling: DEFAULT_JUDGE_SAMPLING,
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Score a story.
    ///
    /// Model failures are returned as errors; an unreadable response is not
    /// an error and yields [`Evaluation::fallback`].
    pub async fn evaluate(&self, input: JudgeInput<'_>) -> Result<Evaluation, JudgeError> {
        let prompt = JudgePrompts::build_evaluation_prompt(input.request, input.story);

        debug!(
            prompt_len = prompt.len(),
            iteration = input.iteration,
            "Running judge evaluation"
        );

        let completion = self
            .model
            .complete(&prompt, self.sampling.max_tokens, self.sampling.temperature)
            .await?;

        let evaluation = Evaluation::parse_or_fallback(&completion.text);

        info!(
            iteration = input.iteration,
            overall_score = evaluation.overall_score(),
            passes = evaluation.passes(),
            fallback = evaluation.is_fallback(),
            duration_secs = completion.duration.as_secs_f64(),
            "Judge completed"
        );

        Ok(evaluation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("Judge model call failed: {0}")]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use storyloop_model::Completion;

    /// Returns one canned reply, or a transport failure when None
    struct CannedModel {
        reply: Option<String>,
        calls: Mutex<Vec<(String, u32, f32)>>,
    }

    impl CannedModel {
        fn new(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(String::from),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Model for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        fn model_id(&self) -> &str {
            "canned-1"
        }

        async fn complete(
            &self,
            prompt: &str,
            max_tokens: u32,
            temperature: f32,
        ) -> Result<Completion, ModelError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), max_tokens, temperature));
            match self.reply {
                Some(ref text) => Ok(Completion::new(text.clone(), Duration::ZERO)),
                None => Err(ModelError::Transport("connection reset".into())),
            }
        }
    }

    fn input() -> JudgeInput<'static> {
        JudgeInput {
            request: "a dragon who is afraid of the dark",
            story: "Ember curled her tail around the lantern.",
            iteration: 0,
        }
    }

    #[tokio::test]
    async fn test_garbage_reply_yields_fallback() {
        let model = CannedModel::new(Some("Lovely story!"));
        let judge = StoryJudge::new(&model);
        let evaluation = judge.evaluate(input()).await.unwrap();
        assert_eq!(evaluation, Evaluation::fallback());
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced() {
        let model = CannedModel::new(None);
        let judge = StoryJudge::new(&model);
        let err = judge.evaluate(input()).await.unwrap_err();
        assert!(matches!(err, JudgeError::Model(ModelError::Transport(_))));
    }

    #[tokio::test]
    async fn test_judge_uses_low_temperature_and_embeds_story() {
        let model = CannedModel::new(Some("{}"));
        let judge = StoryJudge::new(&model);
        judge.evaluate(input()).await.unwrap();

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (prompt, max_tokens, temperature) = &calls[0];
        assert!(prompt.contains("Ember curled her tail around the lantern."));
        assert!(prompt.contains("a dragon who is afraid of the dark"));
        assert_eq!(*max_tokens, 3000);
        assert!((*temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_custom_sampling() {
        let model = CannedModel::new(Some("{}"));
        let judge = StoryJudge::new(&model).with_sampling(Sampling::new(500, 0.0));
        judge.evaluate(input()).await.unwrap();
        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0].1, 500);
    }
}
