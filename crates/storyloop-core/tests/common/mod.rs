//! Scripted doubles for the model and console.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use storyloop_core::Console;
use storyloop_model::{Completion, Model, ModelError};

/// A model that replays scripted replies and records every prompt.
///
/// When the script runs out, the last reply is repeated.
pub struct ScriptedModel {
    id: String,
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    prompts: Mutex<Vec<String>>,
    temperatures: Mutex<Vec<f32>>,
}

#[derive(Clone)]
pub enum Reply {
    Text(String),
    Transport,
    Auth,
}

impl ScriptedModel {
    pub fn new(id: &str, replies: Vec<Reply>) -> Self {
        Self {
            id: id.to_string(),
            script: Mutex::new(replies.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    /// A writer whose nth draft reads "Draft n: ..."
    pub fn numbered_writer(count: usize) -> Self {
        let replies = (1..=count)
            .map(|n| Reply::Text(format!("Draft {}: Once upon a time, a small owl could not find home.", n)))
            .collect();
        Self::new("writer-test", replies)
    }

    pub fn judge(replies: Vec<String>) -> Self {
        Self::new("judge-test", replies.into_iter().map(Reply::Text).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl Model for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.id
    }

    async fn complete(
        &self,
        prompt: &str,
        _max_tokens: u32,
        temperature: f32,
    ) -> Result<Completion, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.temperatures.lock().unwrap().push(temperature);

        let next = self.script.lock().unwrap().pop_front();
        let reply = match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Reply::Text(String::new())),
        };

        match reply {
            Reply::Text(text) => Ok(Completion::new(text, Duration::from_millis(1))),
            Reply::Transport => Err(ModelError::Transport("connection refused".into())),
            Reply::Auth => Err(ModelError::Auth("invalid api key".into())),
        }
    }
}

/// A judge payload with every score set to `score`, except the gating
/// criteria when `passes` is requested.
pub fn judge_reply(passes: bool, feedback: &str) -> String {
    let gate = if passes { 9 } else { 5 };
    format!(
        r#"```json
{{
  "reasoning": {{
    "obstacle": "a lost acorn", "struggle": "two tries", "lesson": "patience",
    "plot": "steady", "sensory": "crunchy leaves", "age": "safe",
    "bedtime": "sleepy", "dialogue": "4 lines", "word_count": "about 1200",
    "magic": "glowing moss"
  }},
  "scores": {{
    "clear_obstacle": {gate}, "real_struggle": {gate}, "lesson_embedded": {gate},
    "plot_momentum": 7, "sensory_detail": 7, "age_appropriate": {gate},
    "bedtime_ready": 8, "dialogue": 7, "word_count": {gate}, "magic_and_wonder": 6
  }},
  "overall_score": 7.0,
  "passes": {passes},
  "feedback": "{feedback}"
}}
```"#,
        gate = gate,
        passes = passes,
        feedback = feedback,
    )
}

/// A console that answers prompts from a script and records output.
///
/// Once the script runs out it behaves like closed stdin.
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
    pub output: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            questions: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn transcript(&self) -> String {
        self.output.join("\n")
    }
}

impl Console for ScriptedConsole {
    fn prompt_user(&mut self, message: &str) -> String {
        self.questions.push(message.to_string());
        self.answers.pop_front().unwrap_or_default()
    }

    fn print(&mut self, message: &str) {
        self.output.push(message.to_string());
    }
}
