//! # ci-jobgen CLI
//!
//! Binary entry point. Parses the command line with `clap`, sets up
//! logging, and hands off to the command modules; the work itself lives in
//! the `ci_jobgen` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
