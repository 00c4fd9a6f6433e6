mod context;
mod error;
mod outcome;
mod prompts;
mod refiner;
pub mod session;
mod story;
mod writer;

pub use context::{CycleRecord, LoopContext, DEFAULT_MAX_ITERATIONS};
pub use error::LoopError;
pub use outcome::RefinementOutcome;
pub use prompts::StoryPrompts;
pub use refiner::Refiner;
pub use session::{
    Console, Session, SessionRound, SessionSettings, StorySession, DEFAULT_MAX_REVISIONS,
};
pub use story::{Story, StoryRequest, EXAMPLE_REQUEST};
pub use writer::{StoryWriter, DEFAULT_WRITER_SAMPLING};
