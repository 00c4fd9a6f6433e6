use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::StoryRequest;

pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// State for one refinement run
#[derive(Debug, Clone)]
pub struct LoopContext {
    /// Request every draft in this run is written for
    pub request: StoryRequest,
    /// Completed write/judge cycles
    pub iteration: usize,
    /// History of all cycles
    pub history: Vec<CycleRecord>,
    /// When the run started
    started_at: Instant,
    /// Cycle budget
    pub max_iterations: usize,
    /// Last feedback from the judge (for the next draft)
    pub last_feedback: Option<String>,
}

/// Record of a single write/judge cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub iteration_number: usize,
    pub story_words: usize,
    pub writer_duration_secs: f64,
    pub overall_score: f64,
    pub passes: bool,
    pub fallback: bool,
    pub feedback: String,
    pub timestamp: DateTime<Utc>,
}

impl LoopContext {
    pub fn new(request: StoryRequest) -> Self {
        Self {
            request,
            iteration: 0,
            history: Vec::new(),
            started_at: Instant::now(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            last_feedback: None,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn increment_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn push_record(&mut self, record: CycleRecord) {
        self.history.push(record);
    }

    pub fn set_feedback(&mut self, feedback: String) {
        self.last_feedback = Some(feedback);
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn should_continue(&self) -> bool {
        self.iteration < self.max_iterations
    }

    /// Feedback for the next draft; the first draft never gets any
    pub fn current_feedback(&self) -> Option<&str> {
        if self.iteration == 0 {
            return None;
        }
        self.last_feedback
            .as_deref()
            .filter(|feedback| !feedback.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget() {
        let mut context = LoopContext::new(StoryRequest::example()).with_max_iterations(2);
        assert!(context.should_continue());
        context.increment_iteration();
        assert!(context.should_continue());
        context.increment_iteration();
        assert!(!context.should_continue());
    }

    #[test]
    fn test_first_draft_has_no_feedback() {
        let mut context = LoopContext::new(StoryRequest::example());
        context.set_feedback("stale".into());
        assert_eq!(context.current_feedback(), None);

        context.increment_iteration();
        assert_eq!(context.current_feedback(), Some("stale"));

        context.set_feedback("  ".into());
        assert_eq!(context.current_feedback(), None);
    }
}
