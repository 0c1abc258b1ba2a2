//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use ci_jobgen::defaults;

use crate::commands;

/// ci-jobgen - Generate CI jobs from packaging metadata
#[derive(Parser, Debug)]
#[command(name = "ci-jobgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = defaults::LOG_LEVEL)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update every job the metadata describes
    Generate(commands::generate::GenerateArgs),

    /// Check the metadata and report every problem without touching Jenkins
    Validate(commands::validate::ValidateArgs),

    /// List the jobs the metadata describes
    Ls(commands::ls::LsArgs),

    /// Show the jobs the metadata describes, grouped by view
    Tree(commands::tree::TreeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Generate(args) => commands::generate::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Ls(args) => commands::ls::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // Logging is best effort; a second initialisation is ignored.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
