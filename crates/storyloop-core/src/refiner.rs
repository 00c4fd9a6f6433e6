use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use storyloop_judge::{Evaluation, JudgeInput, StoryJudge};
use storyloop_logging::{LogEvent, Logger, ModelRole};
use storyloop_model::{Model, Sampling};

use crate::context::CycleRecord;
use crate::error::LoopError;
use crate::outcome::RefinementOutcome;
use crate::{LoopContext, Story, StoryWriter};

/// Drives the write → judge → rewrite loop
pub struct Refiner<'a> {
    writer: StoryWriter<'a>,
    judge: StoryJudge<'a>,
    judge_model_id: String,
    logger: Arc<Logger>,
}

impl<'a> Refiner<'a> {
    pub fn new(writer_model: &'a dyn Model, judge_model: &'a dyn Model, logger: Arc<Logger>) -> Self {
        Self {
            writer: StoryWriter::new(writer_model),
            judge: StoryJudge::new(judge_model),
            judge_model_id: judge_model.model_id().to_string(),
            logger,
        }
    }

    pub fn with_writer_sampling(mut self, sampling: Sampling) -> Self {
        self.writer = self.writer.with_sampling(sampling);
        self
    }

    pub fn with_judge_sampling(mut self, sampling: Sampling) -> Self {
        self.judge = self.judge.with_sampling(sampling);
        self
    }

    /// Run until a draft passes or the cycle budget is spent.
    ///
    /// A model failure in either role aborts the run; no partial story is
    /// returned.
    pub async fn run(&self, mut context: LoopContext) -> Result<RefinementOutcome, LoopError> {
        if context.max_iterations == 0 {
            return Err(LoopError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        self.logger.log(&LogEvent::RefinementStarted {
            request: context.request.to_string(),
            max_iterations: context.max_iterations,
            writer_model: self.writer.model_id().to_string(),
            judge_model: self.judge_model_id.clone(),
        });

        loop {
            let (story, evaluation) = self.run_cycle(&mut context).await?;
            context.increment_iteration();

            if evaluation.passes() {
                self.logger.log(&LogEvent::StoryApproved {
                    iterations: context.iteration,
                    overall_score: evaluation.overall_score(),
                    duration_secs: context.total_duration().as_secs_f64(),
                });
                let duration = context.total_duration();
                return Ok(RefinementOutcome::approved(
                    context.iteration,
                    story,
                    evaluation,
                    context.history,
                    duration,
                ));
            }

            if !context.should_continue() {
                self.logger.log(&LogEvent::BudgetExhausted {
                    iterations: context.iteration,
                    overall_score: evaluation.overall_score(),
                });
                let duration = context.total_duration();
                return Ok(RefinementOutcome::budget_exhausted(
                    context.iteration,
                    story,
                    evaluation,
                    context.history,
                    duration,
                ));
            }

            info!(
                iteration = context.iteration + 1,
                overall_score = evaluation.overall_score(),
                "Refining story"
            );
            context.set_feedback(evaluation.feedback().to_string());
        }
    }

    /// Run a single write/judge cycle
    async fn run_cycle(&self, context: &mut LoopContext) -> Result<(Story, Evaluation), LoopError> {
        let iteration = context.iteration;
        let feedback = context.current_feedback().map(str::to_string);

        self.logger.log(&LogEvent::CycleStarted {
            iteration,
            with_feedback: feedback.is_some(),
        });

        debug!(iteration, "Running writer");
        let started = Instant::now();
        let story = self
            .writer
            .write(&context.request, feedback.as_deref())
            .await
            .map_err(|e| {
                self.log_error(iteration, ModelRole::Writer, &e);
                e
            })?;
        let writer_duration_secs = started.elapsed().as_secs_f64();

        self.logger.log(&LogEvent::StoryWritten {
            iteration,
            words: story.word_count(),
            duration_secs: writer_duration_secs,
        });

        self.logger.log(&LogEvent::JudgeStarted { iteration });

        let input = JudgeInput {
            request: context.request.as_str(),
            story: story.as_str(),
            iteration,
        };
        let evaluation = self.judge.evaluate(input).await.map_err(|e| {
            self.log_error(iteration, ModelRole::Judge, &e);
            e
        })?;

        self.logger.log(&LogEvent::EvaluationCompleted {
            iteration,
            overall_score: evaluation.overall_score(),
            passes: evaluation.passes(),
            fallback: evaluation.is_fallback(),
            failing: evaluation
                .failing_criteria()
                .iter()
                .map(|c| c.score_key().to_string())
                .collect(),
        });

        context.push_record(CycleRecord {
            iteration_number: iteration,
            story_words: story.word_count(),
            writer_duration_secs,
            overall_score: evaluation.overall_score(),
            passes: evaluation.passes(),
            fallback: evaluation.is_fallback(),
            feedback: evaluation.feedback().to_string(),
            timestamp: Utc::now(),
        });

        Ok((story, evaluation))
    }

    fn log_error(&self, iteration: usize, role: ModelRole, error: &dyn std::fmt::Display) {
        self.logger.log(&LogEvent::ErrorEncountered {
            iteration,
            role,
            error: error.to_string(),
        });
    }
}
