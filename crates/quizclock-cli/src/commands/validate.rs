//! The `quizclock validate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizclock_core::config::load_config_from;
use quizclock_core::parser;

pub fn execute(csv: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = csv.unwrap_or(config.csv);

    let set = parser::load_problem_file(&path)?;
    println!("Problem file: {} ({} problems)", path.display(), set.len());

    if !set.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Question", "Answer"]);
        for (i, problem) in set.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(problem.question()),
                Cell::new(problem.answer()),
            ]);
        }
        println!("{table}");
    }

    let warnings = parser::validate_problem_set(&set);
    for w in &warnings {
        let prefix = w
            .problem
            .map(|n| format!("  [#{n}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Problem file valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
