//! Quiz configuration and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level quizclock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Problem file in `question,answer` CSV format.
    #[serde(default = "default_csv")]
    pub csv: PathBuf,
    /// Time limit for the whole quiz, in seconds. Zero or less times out at once.
    #[serde(default = "default_limit_secs")]
    pub limit_secs: i64,
    /// Trim whitespace from typed answers before comparing.
    #[serde(default = "default_true")]
    pub trim_input: bool,
    /// Consecutive failed reads tolerated before the run is abandoned.
    #[serde(default = "default_max_input_failures")]
    pub max_input_failures: u32,
}

fn default_csv() -> PathBuf {
    PathBuf::from("problems.csv")
}
fn default_limit_secs() -> i64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_max_input_failures() -> u32 {
    3
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            csv: default_csv(),
            limit_secs: default_limit_secs(),
            trim_input: true,
            max_input_failures: default_max_input_failures(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizclock.toml` in the current directory
/// 2. `~/.config/quizclock/config.toml`
///
/// Environment variable overrides: `QUIZCLOCK_CSV`, `QUIZCLOCK_LIMIT`.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizclock.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("QUIZCLOCK_CSV").ok(),
        std::env::var("QUIZCLOCK_LIMIT").ok(),
    )?;

    Ok(config)
}

/// Parse a TOML string into a `QuizConfig` (useful for testing).
pub fn parse_config_str(content: &str) -> Result<QuizConfig> {
    Ok(toml::from_str::<QuizConfig>(content)?)
}

fn apply_env_overrides(
    config: &mut QuizConfig,
    csv: Option<String>,
    limit: Option<String>,
) -> Result<()> {
    if let Some(csv) = csv {
        config.csv = PathBuf::from(csv);
    }
    if let Some(limit) = limit {
        config.limit_secs = limit
            .trim()
            .parse()
            .with_context(|| format!("invalid QUIZCLOCK_LIMIT: '{limit}'"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizclock"))
}
