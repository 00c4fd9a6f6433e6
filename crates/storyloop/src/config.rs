//! Configuration file support for storyloop.
//!
//! Loads `storyloop.toml` from the working directory, an explicit
//! `--config` path, or the user config directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use storyloop_model::{ModelKind, Sampling};

/// Configuration loaded from `storyloop.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StoryConfig {
    /// Global default backend (applies to both writer and judge)
    pub backend: Option<String>,
    /// Global default model (applies to both writer and judge)
    pub model: Option<String>,
    /// Writer-specific configuration
    #[serde(default)]
    pub writer: RoleConfig,
    /// Judge-specific configuration
    #[serde(default)]
    pub judge: RoleConfig,
    /// Loop limits
    #[serde(default, rename = "loop")]
    pub limits: LoopConfig,
}

/// Configuration for a specific role (writer or judge)
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    pub backend: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LoopConfig {
    pub max_iterations: Option<usize>,
    pub max_revisions: Option<usize>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "storyloop.toml";

/// Directory under the user config dir
pub const GLOBAL_CONFIG_DIR: &str = "storyloop";

/// File name inside [`GLOBAL_CONFIG_DIR`]
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

impl StoryConfig {
    /// Find and load the configuration.
    ///
    /// An explicit path must exist. Otherwise the working directory is
    /// checked first, then the user config directory.
    ///
    /// Returns:
    /// - `Ok(Some((config, path)))` if a file was found and parsed
    /// - `Ok(None)` if no file exists
    /// - `Err(...)` if a file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path, explicit: Option<&Path>) -> Result<Option<(Self, PathBuf)>> {
        if let Some(path) = explicit {
            let config = Self::load_file(path)?;
            return Ok(Some((config, path.to_path_buf())));
        }

        let candidates = std::iter::once(working_dir.join(CONFIG_FILE_NAME)).chain(
            dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE)),
        );

        for path in candidates {
            if path.exists() {
                let config = Self::load_file(&path)?;
                return Ok(Some((config, path)));
            }
        }

        Ok(None)
    }

    /// Load a single config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Get the effective backend for the writer role.
    /// Priority: [writer].backend > global backend > None
    pub fn writer_backend(&self) -> Result<Option<ModelKind>> {
        parse_backend(self.writer.backend.as_deref().or(self.backend.as_deref()))
    }

    /// Get the effective backend for the judge role.
    /// Priority: [judge].backend > global backend > None
    pub fn judge_backend(&self) -> Result<Option<ModelKind>> {
        parse_backend(self.judge.backend.as_deref().or(self.backend.as_deref()))
    }

    /// Priority: [writer].model > global model > None
    pub fn writer_model(&self) -> Option<&str> {
        self.writer.model.as_deref().or(self.model.as_deref())
    }

    /// Priority: [judge].model > global model > None
    pub fn judge_model(&self) -> Option<&str> {
        self.judge.model.as_deref().or(self.model.as_deref())
    }

    pub fn writer_sampling(&self, default: Sampling) -> Sampling {
        self.writer.sampling(default)
    }

    pub fn judge_sampling(&self, default: Sampling) -> Sampling {
        self.judge.sampling(default)
    }
}

impl RoleConfig {
    fn sampling(&self, default: Sampling) -> Sampling {
        Sampling::new(
            self.max_tokens.unwrap_or(default.max_tokens),
            self.temperature.unwrap_or(default.temperature),
        )
    }
}

/// Highest temperature any backend accepts
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Reject sampling values no backend would accept
pub fn check_sampling(role: &str, sampling: Sampling) -> Result<()> {
    if !(0.0..=MAX_TEMPERATURE).contains(&sampling.temperature) {
        anyhow::bail!(
            "{} temperature must be between 0 and {}, got {}",
            role,
            MAX_TEMPERATURE,
            sampling.temperature
        );
    }
    if sampling.max_tokens == 0 {
        anyhow::bail!("{} max_tokens must be at least 1", role);
    }
    Ok(())
}

fn parse_backend(value: Option<&str>) -> Result<Option<ModelKind>> {
    value
        .map(|s| s.parse::<ModelKind>().map_err(anyhow::Error::msg))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DEFAULT: Sampling = Sampling::new(3000, 0.9);

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_nonexistent_explicit_path_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(StoryConfig::load(temp_dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "backend = \"anthropic\"\n");

        let (config, found) = StoryConfig::load(temp_dir.path(), None).unwrap().unwrap();
        assert_eq!(found, path);
        assert_eq!(config.writer_backend().unwrap(), Some(ModelKind::Anthropic));
    }

    #[test]
    fn test_explicit_path_wins_over_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), "backend = \"anthropic\"\n");
        let other = temp_dir.path().join("other.toml");
        fs::write(&other, "backend = \"openai\"\n").unwrap();

        let (config, found) = StoryConfig::load(temp_dir.path(), Some(&other))
            .unwrap()
            .unwrap();
        assert_eq!(found, other);
        assert_eq!(config.judge_backend().unwrap(), Some(ModelKind::OpenAi));
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
backend = "openai"
model = "gpt-4o-mini"

[writer]
temperature = 0.8
max_tokens = 2500

[judge]
backend = "anthropic"
model = "claude-sonnet-4-20250514"

[loop]
max_iterations = 4
max_revisions = 2
"#,
        );

        let config = StoryConfig::load_file(&path).unwrap();
        assert_eq!(config.writer_backend().unwrap(), Some(ModelKind::OpenAi));
        assert_eq!(config.judge_backend().unwrap(), Some(ModelKind::Anthropic));
        assert_eq!(config.writer_model(), Some("gpt-4o-mini"));
        assert_eq!(config.judge_model(), Some("claude-sonnet-4-20250514"));
        assert_eq!(config.writer_sampling(DEFAULT), Sampling::new(2500, 0.8));
        assert_eq!(config.limits.max_iterations, Some(4));
        assert_eq!(config.limits.max_revisions, Some(2));
    }

    #[test]
    fn test_role_falls_back_to_global_then_default() {
        let config: StoryConfig = toml::from_str("model = \"shared\"\n").unwrap();
        assert_eq!(config.writer_model(), Some("shared"));
        assert_eq!(config.judge_model(), Some("shared"));
        assert_eq!(config.writer_backend().unwrap(), None);
        assert_eq!(config.judge_sampling(DEFAULT), DEFAULT);
    }

    #[test]
    fn test_empty_config() {
        let config: StoryConfig = toml::from_str("").unwrap();
        assert!(config.writer_model().is_none());
        assert!(config.limits.max_iterations.is_none());
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let config: StoryConfig = toml::from_str("backend = \"llama\"\n").unwrap();
        assert!(config.writer_backend().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<StoryConfig, _> = toml::from_str("unknown_field = \"value\"\n");
        assert!(result.is_err());

        let result: Result<StoryConfig, _> = toml::from_str("[writer]\nseed = 4\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_sampling_is_rejected() {
        let config: StoryConfig =
            toml::from_str("[writer]\ntemperature = -1.0\n\n[judge]\nmax_tokens = 0\n").unwrap();

        let writer = config.writer_sampling(DEFAULT);
        let err = check_sampling("writer", writer).unwrap_err();
        assert!(err.to_string().contains("writer temperature"));

        let judge = config.judge_sampling(Sampling::new(3000, 0.1));
        let err = check_sampling("judge", judge).unwrap_err();
        assert!(err.to_string().contains("judge max_tokens"));

        assert!(check_sampling("writer", DEFAULT).is_ok());
        assert!(check_sampling("writer", Sampling::new(1, MAX_TEMPERATURE)).is_ok());
        assert!(check_sampling("writer", Sampling::new(1, f32::NAN)).is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), "this is not valid toml {{{}}}");
        assert!(StoryConfig::load(temp_dir.path(), None).is_err());
    }
}
