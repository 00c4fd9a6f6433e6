use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Story writer failed: {0}")]
    WriterError(#[from] storyloop_model::ModelError),

    #[error("{0}")]
    JudgeError(#[from] storyloop_judge::JudgeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
