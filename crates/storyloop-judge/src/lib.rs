mod evaluation;
pub mod judge;
mod prompts;

pub use evaluation::{
    extract_payload, meets_thresholds, Criterion, Evaluation, EvaluationParseError,
    FALLBACK_FEEDBACK, FALLBACK_OVERALL_SCORE, MAX_SCORE,
};
pub use judge::{JudgeError, JudgeInput, StoryJudge, DEFAULT_JUDGE_SAMPLING};
pub use prompts::JudgePrompts;
