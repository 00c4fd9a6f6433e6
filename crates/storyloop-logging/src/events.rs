use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Role of the model producing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Writer,
    Judge,
}

/// Structured log events for the refinement loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    RefinementStarted {
        request: String,
        max_iterations: usize,
        writer_model: String,
        judge_model: String,
    },
    CycleStarted {
        iteration: usize,
        with_feedback: bool,
    },
    StoryWritten {
        iteration: usize,
        words: usize,
        duration_secs: f64,
    },
    JudgeStarted {
        iteration: usize,
    },
    EvaluationCompleted {
        iteration: usize,
        overall_score: f64,
        passes: bool,
        fallback: bool,
        failing: Vec<String>,
    },
    StoryApproved {
        iterations: usize,
        overall_score: f64,
        duration_secs: f64,
    },
    BudgetExhausted {
        iterations: usize,
        overall_score: f64,
    },
    ErrorEncountered {
        iteration: usize,
        role: ModelRole,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

/// Logger for storyloop events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
    quiet: bool,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
            quiet: false,
        }
    }

    /// A logger that writes nothing to the console
    pub fn quiet() -> Self {
        Self {
            format: LogFormat::Compact,
            file_writer: None,
            quiet: true,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
            quiet: false,
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // Log to file if configured (always JSON format for file)
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if self.quiet {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::RefinementStarted {
                request,
                max_iterations,
                writer_model,
                judge_model,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "storyloop".bold().bright_white(),
                    " ".repeat(58) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Request:".dimmed(),
                    Self::truncate_with_padding(request, 57, 66).dimmed()
                );
                let models = format!(
                    "{} / {} (up to {} drafts)",
                    writer_model, judge_model, max_iterations
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Models:".dimmed(),
                    Self::truncate_with_padding(&models, 58, 67).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::CycleStarted {
                iteration,
                with_feedback,
            } => {
                let label = Self::cycle_label(*iteration, *with_feedback);
                let padding = "─".repeat(67usize.saturating_sub(label.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    label.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "WRITER".bright_cyan().bold()
                );
            }
            LogEvent::StoryWritten {
                words,
                duration_secs,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} {} words ({:.1}s)",
                    "✓".bright_green(),
                    words,
                    duration_secs
                );
                let _ = writeln!(stderr);
            }
            LogEvent::JudgeStarted { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "JUDGE".bright_magenta().bold()
                );
            }
            LogEvent::EvaluationCompleted {
                overall_score,
                passes,
                fallback,
                failing,
                ..
            } => {
                let styled = if *fallback {
                    format!(
                        "? Score: {:.1}/10 (evaluation unreadable, retrying)",
                        overall_score
                    )
                    .bright_yellow()
                    .to_string()
                } else if *passes {
                    format!("✓ Score: {:.1}/10", overall_score)
                        .bright_green()
                        .to_string()
                } else {
                    format!(
                        "→ Score: {:.1}/10, below minimum: {}",
                        overall_score,
                        failing.join(", ")
                    )
                    .bright_yellow()
                    .to_string()
                };
                let _ = writeln!(stderr, "    {}", styled);
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::StoryApproved { iterations, .. } => {
                let _ = writeln!(
                    stderr,
                    "{} Story approved by judge after {} {}",
                    "✓".bright_green(),
                    iterations,
                    if *iterations == 1 { "draft" } else { "drafts" }
                );
            }
            LogEvent::BudgetExhausted {
                iterations,
                overall_score,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} Story complete (reached max iterations: {}, last score {:.1}/10)",
                    "⚠".bright_yellow(),
                    iterations,
                    overall_score
                );
            }
            LogEvent::ErrorEncountered {
                iteration,
                role,
                error,
            } => {
                let role = match role {
                    ModelRole::Writer => "writer",
                    ModelRole::Judge => "judge",
                };
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error from {} in iteration {}: {}",
                    "✗".bright_red(),
                    role,
                    iteration + 1,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::RefinementStarted { max_iterations, .. } => {
                format!("[{}] refine:start max={}", timestamp, max_iterations)
            }
            LogEvent::CycleStarted { iteration, .. } => {
                format!("[{}] writer:start:{}", timestamp, iteration + 1)
            }
            LogEvent::StoryWritten {
                iteration,
                words,
                duration_secs,
            } => format!(
                "[{}] writer:done:{} words={} {:.1}s",
                timestamp,
                iteration + 1,
                words,
                duration_secs
            ),
            LogEvent::JudgeStarted { iteration } => {
                format!("[{}] judge:start:{}", timestamp, iteration + 1)
            }
            LogEvent::EvaluationCompleted {
                iteration,
                overall_score,
                passes,
                fallback,
                ..
            } => format!(
                "[{}] judge:done:{} score={:.1} {}",
                timestamp,
                iteration + 1,
                overall_score,
                match (fallback, passes) {
                    (true, _) => "fallback",
                    (false, true) => "pass",
                    (false, false) => "fail",
                }
            ),
            LogEvent::StoryApproved {
                iterations,
                duration_secs,
                ..
            } => format!(
                "[{}] refine:approved:{} {:.1}s",
                timestamp, iterations, duration_secs
            ),
            LogEvent::BudgetExhausted { iterations, .. } => {
                format!("[{}] refine:limit:{}", timestamp, iterations)
            }
            LogEvent::ErrorEncountered {
                iteration, error, ..
            } => {
                format!("[{}] error:{}:{}", timestamp, iteration + 1, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    /// Header for a cycle; every cycle after the first is a refinement
    fn cycle_label(iteration: usize, with_feedback: bool) -> String {
        match (iteration, with_feedback) {
            (0, _) => "─ Generating initial story ".to_string(),
            (n, true) => format!("─ Refining story (iteration {}) ", n + 1),
            (n, false) => format!("─ Refining story (iteration {}, no feedback) ", n + 1),
        }
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let char_count = s.chars().count();
        let truncated = if char_count > max_len {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1); // +1 for trailing │
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LogEvent::EvaluationCompleted {
            iteration: 1,
            overall_score: 7.5,
            passes: false,
            fallback: false,
            failing: vec!["word_count".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "evaluation_completed");
        assert_eq!(json["failing"][0], "word_count");
    }

    #[test]
    fn test_timestamp_added_for_file_output() {
        let event = LogEvent::JudgeStarted { iteration: 0 };
        let value = event.with_timestamp();
        assert!(value["timestamp"].is_string());
        assert_eq!(value["event"], "judge_started");
    }

    #[test]
    fn test_truncate_with_padding_handles_multibyte() {
        let line = Logger::truncate_with_padding("ünïcödé dragons and a very long tail", 10, 20);
        assert!(line.starts_with("ünïcöd"));
        assert!(line.ends_with('│'));
        assert_eq!(line.chars().count(), 20);
    }

    #[test]
    fn test_file_logging_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("storyloop.jsonl");
        let mut logger = Logger::with_file(LogFormat::Compact, &path).unwrap();
        logger.quiet = true;

        logger.log(&LogEvent::CycleStarted {
            iteration: 0,
            with_feedback: false,
        });
        logger.log(&LogEvent::BudgetExhausted {
            iterations: 3,
            overall_score: 6.2,
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["event"], "budget_exhausted");
        assert_eq!(last["iterations"], 3);
    }

    #[test]
    fn test_cycle_label_follows_iteration() {
        assert_eq!(Logger::cycle_label(0, false), "─ Generating initial story ");
        assert_eq!(
            Logger::cycle_label(1, true),
            "─ Refining story (iteration 2) "
        );
        // A judge that returned blank feedback still counts as a refinement
        assert_eq!(
            Logger::cycle_label(2, false),
            "─ Refining story (iteration 3, no feedback) "
        );
    }
}
