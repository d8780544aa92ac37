//! The `quizclock init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("quizclock.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("problems.csv"), SAMPLE_PROBLEMS)?;

    println!("\nNext steps:");
    println!("  1. Edit problems.csv with your own questions");
    println!("  2. Run: quizclock validate");
    println!("  3. Run: quizclock run --limit 30");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizclock configuration

csv = "problems.csv"
limit_secs = 30
trim_input = true
max_input_failures = 3
"#;

const SAMPLE_PROBLEMS: &str = "5+5,10
7+3,10
1+1,2
8+3,11
1+2,3
8+6,14
3+1,4
1+4,5
5+1,6
2+3,5
3+3,6
2+4,6
5+2,7
\"what 2+2, sir?\",4
capital of France,Paris
";
