//! quizclock CLI — a timed quiz in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizclock", version, about = "Timed terminal quiz over a CSV problem file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the quiz
    Run {
        /// A CSV file in the format of 'question,answer'
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Time limit for the whole quiz in seconds
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,

        /// Compare typed answers exactly, without trimming whitespace
        #[arg(long)]
        strict: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a problem file
    Validate {
        /// A CSV file in the format of 'question,answer'
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and problem file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizclock=warn".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            csv,
            limit,
            strict,
            config,
        } => commands::run::execute(csv, limit, strict, config).await,
        Commands::Validate { csv, config } => commands::validate::execute(csv, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
