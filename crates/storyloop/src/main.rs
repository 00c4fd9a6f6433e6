mod config;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use storyloop_core::{
    Refiner, SessionSettings, StorySession, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_REVISIONS,
    DEFAULT_WRITER_SAMPLING,
};
use storyloop_judge::DEFAULT_JUDGE_SAMPLING;
use storyloop_logging::{init_tracing, LogFormat, Logger};
use storyloop_model::{create_model, ModelConfig, ModelKind};

use crate::config::{check_sampling, StoryConfig};
use crate::console::TerminalConsole;

/// Exit code when the first story could not be produced
const EXIT_INITIAL_ROUND_FAILED: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "storyloop",
    about = "Bedtime story generator with a write and judge refinement loop",
    version,
    author
)]
struct Cli {
    /// Path to a config file (default: ./storyloop.toml, then the user config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write/judge cycles per story (default: 3)
    #[arg(short = 'n', long)]
    max_iterations: Option<usize>,

    /// Revision rounds offered after the first story (default: 3)
    #[arg(long)]
    max_revisions: Option<usize>,

    /// Backend to use for both writer and judge
    #[arg(short, long, value_enum)]
    backend: Option<BackendChoice>,

    /// Model to use for both writer and judge
    #[arg(short, long)]
    model: Option<String>,

    /// Model to use specifically for the writer
    #[arg(long)]
    writer_model: Option<String>,

    /// Model to use specifically for the judge
    #[arg(long)]
    judge_model: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Tracing filter (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Append JSON event lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Dry run: show the resolved settings without calling any model
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendChoice {
    Openai,
    Anthropic,
}

impl From<BackendChoice> for ModelKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Openai => ModelKind::OpenAi,
            BackendChoice::Anthropic => ModelKind::Anthropic,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

/// Writer or judge settings after merging flags, config and defaults
#[derive(Debug)]
struct RoleSettings {
    kind: ModelKind,
    config: ModelConfig,
}

impl RoleSettings {
    fn resolve(
        cli_backend: Option<BackendChoice>,
        config_backend: Option<ModelKind>,
        model: Option<String>,
    ) -> Self {
        let kind = cli_backend
            .map(ModelKind::from)
            .or(config_backend)
            .unwrap_or(ModelKind::OpenAi);
        let mut config = ModelConfig::default();
        if let Some(model) = model {
            config = config.with_model(model);
        }
        Self { kind, config }
    }

    fn describe(&self) -> String {
        match &self.config.model {
            Some(model) => format!("{} ({})", self.kind, model),
            None => format!("{} (backend default)", self.kind),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Credentials may live in .env
    dotenvy::dotenv().ok();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let file_config = StoryConfig::load(&working_dir, cli.config.as_deref())?;
    if let Some((_, path)) = &file_config {
        tracing::debug!(path = %path.display(), "Loaded config");
    }
    let file_config = file_config.map(|(config, _)| config).unwrap_or_default();

    // Priority: CLI flag > role table > global config > built-in default
    let writer = RoleSettings::resolve(
        cli.backend,
        file_config.writer_backend()?,
        cli.writer_model
            .clone()
            .or_else(|| cli.model.clone())
            .or_else(|| file_config.writer_model().map(String::from)),
    );
    let judge = RoleSettings::resolve(
        cli.backend,
        file_config.judge_backend()?,
        cli.judge_model
            .clone()
            .or_else(|| cli.model.clone())
            .or_else(|| file_config.judge_model().map(String::from)),
    );
    let writer_sampling = file_config.writer_sampling(DEFAULT_WRITER_SAMPLING);
    let judge_sampling = file_config.judge_sampling(DEFAULT_JUDGE_SAMPLING);
    check_sampling("writer", writer_sampling)?;
    check_sampling("judge", judge_sampling)?;

    let settings = SessionSettings {
        max_iterations: cli
            .max_iterations
            .or(file_config.limits.max_iterations)
            .unwrap_or(DEFAULT_MAX_ITERATIONS),
        max_revisions: cli
            .max_revisions
            .or(file_config.limits.max_revisions)
            .unwrap_or(DEFAULT_MAX_REVISIONS),
    };
    if settings.max_iterations == 0 {
        anyhow::bail!("max_iterations must be at least 1");
    }

    if cli.dry_run {
        println!("=== Dry Run ===");
        println!(
            "Writer: {} temperature={} max_tokens={}",
            writer.describe(),
            writer_sampling.temperature,
            writer_sampling.max_tokens
        );
        println!(
            "Judge: {} temperature={} max_tokens={}",
            judge.describe(),
            judge_sampling.temperature,
            judge_sampling.max_tokens
        );
        println!("Max iterations: {}", settings.max_iterations);
        println!("Max revisions: {}", settings.max_revisions);
        return Ok(());
    }

    let writer_model = create_model(writer.kind, &writer.config)
        .with_context(|| format!("Failed to set up writer backend '{}'", writer.kind))?;
    let judge_model = create_model(judge.kind, &judge.config)
        .with_context(|| format!("Failed to set up judge backend '{}'", judge.kind))?;

    let logger = match &cli.log_file {
        Some(path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    let refiner = Refiner::new(writer_model.as_ref(), judge_model.as_ref(), Arc::new(logger))
        .with_writer_sampling(writer_sampling)
        .with_judge_sampling(judge_sampling);

    let mut console = TerminalConsole::new();
    let result = StorySession::new(&refiner, &mut console)
        .with_settings(settings)
        .run()
        .await;

    if let Err(e) = result {
        eprintln!();
        eprintln!("=== FAILED ===");
        eprintln!("Could not create a story: {}", e);
        std::process::exit(EXIT_INITIAL_ROUND_FAILED);
    }

    Ok(())
}
