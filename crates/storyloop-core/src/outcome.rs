use serde::Serialize;
use std::time::Duration;
use storyloop_judge::Evaluation;

use crate::{CycleRecord, Story};

/// The final result of a refinement run.
///
/// Both variants carry the last story and its evaluation; callers that only
/// care about the verdict can check `evaluation().passes()`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefinementOutcome {
    /// The judge approved a draft
    Approved {
        iterations: usize,
        story: Story,
        evaluation: Evaluation,
        #[serde(skip)]
        history: Vec<CycleRecord>,
        total_duration_secs: f64,
    },
    /// The cycle budget ran out before any draft passed
    BudgetExhausted {
        iterations: usize,
        story: Story,
        evaluation: Evaluation,
        #[serde(skip)]
        history: Vec<CycleRecord>,
        total_duration_secs: f64,
    },
}

impl RefinementOutcome {
    pub fn approved(
        iterations: usize,
        story: Story,
        evaluation: Evaluation,
        history: Vec<CycleRecord>,
        duration: Duration,
    ) -> Self {
        Self::Approved {
            iterations,
            story,
            evaluation,
            history,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn budget_exhausted(
        iterations: usize,
        story: Story,
        evaluation: Evaluation,
        history: Vec<CycleRecord>,
        duration: Duration,
    ) -> Self {
        Self::BudgetExhausted {
            iterations,
            story,
            evaluation,
            history,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            Self::Approved { iterations, .. } => *iterations,
            Self::BudgetExhausted { iterations, .. } => *iterations,
        }
    }

    pub fn story(&self) -> &Story {
        match self {
            Self::Approved { story, .. } => story,
            Self::BudgetExhausted { story, .. } => story,
        }
    }

    pub fn evaluation(&self) -> &Evaluation {
        match self {
            Self::Approved { evaluation, .. } => evaluation,
            Self::BudgetExhausted { evaluation, .. } => evaluation,
        }
    }

    pub fn history(&self) -> &[CycleRecord] {
        match self {
            Self::Approved { history, .. } => history,
            Self::BudgetExhausted { history, .. } => history,
        }
    }

    pub fn total_duration_secs(&self) -> f64 {
        match self {
            Self::Approved {
                total_duration_secs,
                ..
            } => *total_duration_secs,
            Self::BudgetExhausted {
                total_duration_secs,
                ..
            } => *total_duration_secs,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// Split into the final story and its evaluation
    pub fn into_parts(self) -> (Story, Evaluation) {
        match self {
            Self::Approved {
                story, evaluation, ..
            } => (story, evaluation),
            Self::BudgetExhausted {
                story, evaluation, ..
            } => (story, evaluation),
        }
    }
}
