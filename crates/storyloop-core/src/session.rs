//! Interactive session: one initial story plus user-requested revisions.

use serde::Serialize;
use storyloop_judge::Evaluation;
use tracing::{info, warn};

use crate::error::LoopError;
use crate::{LoopContext, Refiner, Story, StoryRequest, DEFAULT_MAX_ITERATIONS};

pub const DEFAULT_MAX_REVISIONS: usize = 3;

const RULE: &str = "============================================================";

/// Line-oriented user interaction
pub trait Console {
    /// Ask the user something. Returns an empty string on end of input.
    fn prompt_user(&mut self, message: &str) -> String;

    /// Show a message to the user
    fn print(&mut self, message: &str);
}

/// Limits for one session
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Write/judge cycles per round
    pub max_iterations: usize,
    /// Revision rounds offered after the first story
    pub max_revisions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_revisions: DEFAULT_MAX_REVISIONS,
        }
    }
}

/// One completed round of a session
#[derive(Debug, Serialize)]
pub struct SessionRound {
    pub request: StoryRequest,
    pub story: Story,
    pub evaluation: Evaluation,
    pub iterations: usize,
}

/// Everything produced during one session
#[derive(Debug, Default, Serialize)]
pub struct Session {
    pub rounds: Vec<SessionRound>,
    /// Revision rounds abandoned because a model call failed
    pub failed_revisions: usize,
}

impl Session {
    /// The most recent story shown to the user
    pub fn latest_story(&self) -> Option<&Story> {
        self.rounds.last().map(|round| &round.story)
    }

    pub fn revisions(&self) -> usize {
        self.rounds.len().saturating_sub(1)
    }
}

/// Runs the initial request and the revision rounds
pub struct StorySession<'a> {
    refiner: &'a Refiner<'a>,
    console: &'a mut dyn Console,
    settings: SessionSettings,
}

impl<'a> StorySession<'a> {
    pub fn new(refiner: &'a Refiner<'a>, console: &'a mut dyn Console) -> Self {
        Self {
            refiner,
            console,
            settings: SessionSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run the whole interaction.
    ///
    /// Fails only when the first round fails, since there is nothing to
    /// revise without a story. A failed revision round is reported and
    /// skipped.
    pub async fn run(&mut self) -> Result<Session, LoopError> {
        self.print_welcome();

        let answer = self
            .console
            .prompt_user("What kind of story do you want to hear? ");
        let original = match answer.trim() {
            "" => {
                let example = StoryRequest::example();
                self.console
                    .print(&format!("\nUsing example request: {}\n", example));
                example
            }
            text => StoryRequest::new(text),
        };

        let mut session = Session::default();

        let round = self.run_round(original.clone()).await?;
        self.show_story("YOUR BEDTIME STORY", &round.story);
        session.rounds.push(round);

        for revision in 1..=self.settings.max_revisions {
            let feedback = self.ask_for_revision();
            if feedback.is_empty() {
                break;
            }

            self.console
                .print("\nCreating a revised version based on your feedback...\n");
            match self.run_round(original.with_revision(&feedback)).await {
                Ok(round) => {
                    self.show_story(&format!("REVISION {}", revision), &round.story);
                    session.rounds.push(round);
                }
                Err(e) => {
                    warn!(revision, error = %e, "Revision round failed");
                    self.console.print(&format!(
                        "\nSorry, revision {} could not be completed: {}\n",
                        revision, e
                    ));
                    session.failed_revisions += 1;
                }
            }
        }

        self.console
            .print("\nThank you for using the Bedtime Story Generator! Sweet dreams!\n");
        info!(
            rounds = session.rounds.len(),
            failed_revisions = session.failed_revisions,
            "Session finished"
        );
        Ok(session)
    }

    async fn run_round(&mut self, request: StoryRequest) -> Result<SessionRound, LoopError> {
        let context =
            LoopContext::new(request.clone()).with_max_iterations(self.settings.max_iterations);
        let outcome = self.refiner.run(context).await?;
        let iterations = outcome.iterations();
        info!(
            iterations,
            approved = outcome.is_approved(),
            duration_secs = outcome.total_duration_secs(),
            "Round finished"
        );
        let (story, evaluation) = outcome.into_parts();

        Ok(SessionRound {
            request,
            story,
            evaluation,
            iterations,
        })
    }

    fn ask_for_revision(&mut self) -> String {
        self.console.print(&format!(
            "\n{}\nWould you like to add or change anything in the story?\n\
             (Examples: 'Make it funnier', 'Add a talking animal', 'Make it shorter', etc.)\n\
             Or press Enter to keep it as is.\n{}\n",
            RULE, RULE
        ));
        self.console
            .prompt_user("Your feedback: ")
            .trim()
            .to_string()
    }

    fn print_welcome(&mut self) {
        self.console.print(&format!(
            "{}\n\nWelcome to the Bedtime Story Generator!\n{}\n\n\
             I can create magical bedtime stories for children ages 5-10 based on your requests.\n\n\
             Examples:\n   \
             - A story about a brave mouse who explores a castle.\n   \
             - Tell me about a friendship between a girl and a dragon.\n   \
             - A story about a boy who finds a magic paintbrush.\n{}",
            RULE, RULE, RULE
        ));
    }

    fn show_story(&mut self, title: &str, story: &Story) {
        self.console.print(&format!(
            "\n{}\n{}\n{}\n\n{}\n\n{}",
            RULE, title, RULE, story, RULE
        ));
    }
}
