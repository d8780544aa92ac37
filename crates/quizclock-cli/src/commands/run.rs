//! The `quizclock run` command.

use std::path::PathBuf;

use anyhow::Result;

use quizclock_core::config::load_config_from;
use quizclock_core::input::LineSource;
use quizclock_core::parser;
use quizclock_core::runner::{QuizRunner, RunnerConfig};

pub async fn execute(
    csv: Option<PathBuf>,
    limit: Option<i64>,
    strict: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;

    // Flags win over the config file
    if let Some(csv) = csv {
        config.csv = csv;
    }
    if let Some(limit) = limit {
        config.limit_secs = limit;
    }
    if strict {
        config.trim_input = false;
    }

    let problems = parser::load_problem_file(&config.csv)?;
    tracing::info!(
        csv = %config.csv.display(),
        problems = problems.len(),
        limit_secs = config.limit_secs,
        "starting quiz"
    );

    let runner = QuizRunner::new(RunnerConfig::from(&config));
    let mut stdout = std::io::stdout();
    let outcome = runner
        .run(&problems, LineSource::stdin(), &mut stdout)
        .await?;

    if outcome.is_timed_out() {
        tracing::info!("time limit reached");
    }

    Ok(())
}
