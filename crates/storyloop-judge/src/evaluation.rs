use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Feedback carried forward when the judge's response could not be read
pub const FALLBACK_FEEDBACK: &str =
    "The previous draft could not be scored. Rewrite the story, keeping closely to the requested structure.";

/// Overall score reported for an unreadable evaluation
pub const FALLBACK_OVERALL_SCORE: f64 = 5.0;

/// Highest score a criterion can receive
pub const MAX_SCORE: u8 = 10;

/// Rubric criteria, keyed on the wire by their score names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    ClearObstacle,
    RealStruggle,
    LessonEmbedded,
    PlotMomentum,
    SensoryDetail,
    AgeAppropriate,
    BedtimeReady,
    Dialogue,
    WordCount,
    MagicAndWonder,
}

impl Criterion {
    pub const ALL: [Criterion; 10] = [
        Criterion::ClearObstacle,
        Criterion::RealStruggle,
        Criterion::LessonEmbedded,
        Criterion::PlotMomentum,
        Criterion::SensoryDetail,
        Criterion::AgeAppropriate,
        Criterion::BedtimeReady,
        Criterion::Dialogue,
        Criterion::WordCount,
        Criterion::MagicAndWonder,
    ];

    /// Key used in the `scores` object
    pub fn score_key(self) -> &'static str {
        match self {
            Criterion::ClearObstacle => "clear_obstacle",
            Criterion::RealStruggle => "real_struggle",
            Criterion::LessonEmbedded => "lesson_embedded",
            Criterion::PlotMomentum => "plot_momentum",
            Criterion::SensoryDetail => "sensory_detail",
            Criterion::AgeAppropriate => "age_appropriate",
            Criterion::BedtimeReady => "bedtime_ready",
            Criterion::Dialogue => "dialogue",
            Criterion::WordCount => "word_count",
            Criterion::MagicAndWonder => "magic_and_wonder",
        }
    }

    /// Key used in the `reasoning` object
    pub fn reasoning_key(self) -> &'static str {
        match self {
            Criterion::ClearObstacle => "obstacle",
            Criterion::RealStruggle => "struggle",
            Criterion::LessonEmbedded => "lesson",
            Criterion::PlotMomentum => "plot",
            Criterion::SensoryDetail => "sensory",
            Criterion::AgeAppropriate => "age",
            Criterion::BedtimeReady => "bedtime",
            Criterion::Dialogue => "dialogue",
            Criterion::WordCount => "word_count",
            Criterion::MagicAndWonder => "magic",
        }
    }

    /// Minimum score required to pass, for the gating criteria
    pub fn pass_minimum(self) -> Option<u8> {
        match self {
            Criterion::ClearObstacle => Some(8),
            Criterion::RealStruggle => Some(8),
            Criterion::LessonEmbedded => Some(8),
            Criterion::AgeAppropriate => Some(9),
            Criterion::WordCount => Some(7),
            _ => None,
        }
    }
}

/// Whether a set of scores clears every gating minimum.
///
/// A missing gating criterion counts as failing.
pub fn meets_thresholds(scores: &BTreeMap<Criterion, u8>) -> bool {
    Criterion::ALL.iter().all(|c| match c.pass_minimum() {
        Some(min) => scores.get(c).is_some_and(|s| *s >= min),
        None => true,
    })
}

/// A judged story.
///
/// Fields are private so `passes` and `overall_score` always agree with
/// `scores`; build one with [`Evaluation::from_scores`], [`Evaluation::parse`]
/// or [`Evaluation::fallback`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    reasoning: BTreeMap<Criterion, String>,
    scores: BTreeMap<Criterion, u8>,
    overall_score: f64,
    passes: bool,
    feedback: String,
}

#[derive(Error, Debug)]
pub enum EvaluationParseError {
    #[error("Failed to parse evaluation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Score for {criterion} out of range: {score}")]
    ScoreOutOfRange { criterion: &'static str, score: u8 },

    #[error("Missing score for {criterion}")]
    MissingScore { criterion: &'static str },
}

/// Wire shape of the judge's payload. Every field is required.
#[derive(Debug, Deserialize)]
struct Payload {
    reasoning: ReasoningPayload,
    scores: ScoresPayload,
    overall_score: f64,
    passes: bool,
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct ReasoningPayload {
    obstacle: String,
    struggle: String,
    lesson: String,
    plot: String,
    sensory: String,
    age: String,
    bedtime: String,
    dialogue: String,
    word_count: String,
    magic: String,
}

#[derive(Debug, Deserialize)]
struct ScoresPayload {
    clear_obstacle: u8,
    real_struggle: u8,
    lesson_embedded: u8,
    plot_momentum: u8,
    sensory_detail: u8,
    age_appropriate: u8,
    bedtime_ready: u8,
    dialogue: u8,
    word_count: u8,
    magic_and_wonder: u8,
}

impl ReasoningPayload {
    fn into_map(self) -> BTreeMap<Criterion, String> {
        BTreeMap::from([
            (Criterion::ClearObstacle, self.obstacle),
            (Criterion::RealStruggle, self.struggle),
            (Criterion::LessonEmbedded, self.lesson),
            (Criterion::PlotMomentum, self.plot),
            (Criterion::SensoryDetail, self.sensory),
            (Criterion::AgeAppropriate, self.age),
            (Criterion::BedtimeReady, self.bedtime),
            (Criterion::Dialogue, self.dialogue),
            (Criterion::WordCount, self.word_count),
            (Criterion::MagicAndWonder, self.magic),
        ])
    }
}

impl ScoresPayload {
    fn into_map(self) -> BTreeMap<Criterion, u8> {
        BTreeMap::from([
            (Criterion::ClearObstacle, self.clear_obstacle),
            (Criterion::RealStruggle, self.real_struggle),
            (Criterion::LessonEmbedded, self.lesson_embedded),
            (Criterion::PlotMomentum, self.plot_momentum),
            (Criterion::SensoryDetail, self.sensory_detail),
            (Criterion::AgeAppropriate, self.age_appropriate),
            (Criterion::BedtimeReady, self.bedtime_ready),
            (Criterion::Dialogue, self.dialogue),
            (Criterion::WordCount, self.word_count),
            (Criterion::MagicAndWonder, self.magic_and_wonder),
        ])
    }
}

impl Evaluation {
    /// Build an evaluation, deriving `overall_score` and `passes` from `scores`.
    ///
    /// Every criterion must be scored, and no score may exceed [`MAX_SCORE`].
    pub fn from_scores(
        scores: BTreeMap<Criterion, u8>,
        reasoning: BTreeMap<Criterion, String>,
        feedback: String,
    ) -> Result<Self, EvaluationParseError> {
        for criterion in Criterion::ALL {
            match scores.get(&criterion) {
                None => {
                    return Err(EvaluationParseError::MissingScore {
                        criterion: criterion.score_key(),
                    })
                }
                Some(&score) if score > MAX_SCORE => {
                    return Err(EvaluationParseError::ScoreOutOfRange {
                        criterion: criterion.score_key(),
                        score,
                    })
                }
                Some(_) => {}
            }
        }

        let overall_score =
            scores.values().map(|s| f64::from(*s)).sum::<f64>() / Criterion::ALL.len() as f64;
        let passes = meets_thresholds(&scores);

        Ok(Self {
            reasoning,
            scores,
            overall_score,
            passes,
            feedback,
        })
    }

    /// The evaluation substituted when the judge's response is unreadable
    pub fn fallback() -> Self {
        Self {
            reasoning: BTreeMap::new(),
            scores: BTreeMap::new(),
            overall_score: FALLBACK_OVERALL_SCORE,
            passes: false,
            feedback: FALLBACK_FEEDBACK.to_string(),
        }
    }

    /// Parse the judge's raw response.
    ///
    /// The payload may be wrapped in a markdown fence:
    /// ````text
    /// ```json
    /// {"reasoning": {...}, "scores": {...}, "overall_score": 8.1, "passes": true, "feedback": "..."}
    /// ```
    /// ````
    /// The model's `overall_score` and `passes` are advisory; both are
    /// recomputed from `scores`.
    pub fn parse(response: &str) -> Result<Self, EvaluationParseError> {
        let json_str = extract_payload(response);
        debug!(payload_len = json_str.len(), "Parsing evaluation payload");

        let payload: Payload = serde_json::from_str(json_str)?;
        let claimed_passes = payload.passes;
        let claimed_overall = payload.overall_score;

        let evaluation = Self::from_scores(
            payload.scores.into_map(),
            payload.reasoning.into_map(),
            payload.feedback,
        )?;

        if claimed_passes != evaluation.passes {
            warn!(
                claimed = claimed_passes,
                computed = evaluation.passes,
                "Judge's pass verdict disagrees with its scores; using computed verdict"
            );
        }
        if (claimed_overall - evaluation.overall_score).abs() > 0.05 {
            debug!(
                claimed = claimed_overall,
                computed = evaluation.overall_score,
                "Judge's overall score differs from the mean of its scores"
            );
        }

        Ok(evaluation)
    }

    /// Parse the judge's response, substituting [`Evaluation::fallback`] on any failure
    pub fn parse_or_fallback(response: &str) -> Self {
        match Self::parse(response) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(error = %e, "Unreadable evaluation; using fallback");
                Self::fallback()
            }
        }
    }

    pub fn reasoning(&self) -> &BTreeMap<Criterion, String> {
        &self.reasoning
    }

    pub fn scores(&self) -> &BTreeMap<Criterion, u8> {
        &self.scores
    }

    pub fn score(&self, criterion: Criterion) -> Option<u8> {
        self.scores.get(&criterion).copied()
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn passes(&self) -> bool {
        self.passes
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Whether this is the substitute for an unreadable response
    pub fn is_fallback(&self) -> bool {
        self.scores.is_empty()
    }

    /// Gating criteria that fell short of their minimum
    pub fn failing_criteria(&self) -> Vec<Criterion> {
        Criterion::ALL
            .iter()
            .copied()
            .filter(|c| match c.pass_minimum() {
                Some(min) => self.score(*c).map_or(true, |s| s < min),
                None => false,
            })
            .collect()
    }

    /// Get a short description of the evaluation for logging
    pub fn short_description(&self) -> String {
        if self.is_fallback() {
            return "UNREADABLE (fallback)".to_string();
        }
        let verdict = if self.passes { "PASS" } else { "FAIL" };
        format!("{} ({:.1}/10)", verdict, self.overall_score)
    }
}

/// Strip a markdown fence from around the payload.
///
/// A ```` ```json ```` block wins, then any fenced block (dropping a
/// language word on the fence line), else the whole trimmed response.
pub fn extract_payload(response: &str) -> &str {
    if let Some(pos) = response.find("```json") {
        let rest = &response[pos + "```json".len()..];
        let end = rest.find("```").unwrap_or(rest.len());
        return rest[..end].trim();
    }

    if let Some(pos) = response.find("```") {
        let rest = &response[pos + 3..];
        let end = rest.find("```").unwrap_or(rest.len());
        let block = &rest[..end];
        let block = match block.split_once('\n') {
            Some((first, body)) if is_language_tag(first) => body,
            _ => block,
        };
        return block.trim();
    }

    response.trim()
}

fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
