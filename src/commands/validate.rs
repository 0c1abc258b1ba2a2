//! # Validate Command Implementation
//!
//! The `validate` subcommand fetches and resolves the metadata, then plans
//! every job without contacting Jenkins. Schema problems stop it at the
//! first error, as they would stop a real run; job generation problems are
//! collected so that all of them are reported at once.
//!
//! This command is read-only and exits non-zero on any problem.

use anyhow::Result;
use clap::Args;

use ci_jobgen::config::ConfigType;
use ci_jobgen::metrics::Metrics;
use ci_jobgen::output::{OutputConfig, Status};
use ci_jobgen::reconcile::{GenerationPolicy, Reconciler};

use super::MetadataArgs;

/// Check the metadata and report every problem
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub metadata: MetadataArgs,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let source = args.metadata.source()?;
    println!("{} Validating metadata: {}", out.marker(Status::Fetch), source);

    let mut metrics = Metrics::new();
    let metadata = match args.metadata.load(&source, &mut metrics) {
        Ok(metadata) => metadata,
        Err(e) => {
            println!("{} {:#}", out.marker(Status::Failed), e);
            return Err(e);
        }
    };
    println!("{} Metadata is valid", out.marker(Status::Done));

    let reconciler = Reconciler::new(args.metadata.builder()?, GenerationPolicy::SkipAndContinue);
    let plan = match reconciler.plan(&metadata) {
        Ok(plan) => plan,
        Err(e) => {
            println!("{} {}", out.marker(Status::Failed), e);
            return Err(e.into());
        }
    };

    println!("\n{} Summary:", out.marker(Status::Plan));
    for (label, config_type) in [
        ("Stable groups", ConfigType::Stable),
        ("Unstable groups", ConfigType::Unstable),
        ("Merger groups", ConfigType::Merger),
    ] {
        println!("   {}: {}", label, metadata.of_type(config_type).count());
    }
    println!("   Repositories: {}", metadata.repository_count());
    println!(
        "   Releases: {}",
        plan.releases.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!("   Jobs: {}", plan.len());
    println!("   Views: {}", plan.views().len());

    if let Some(err) = plan.skipped_error() {
        println!();
        for skipped in &plan.skipped {
            println!("{} {}", out.marker(Status::Failed), skipped.reason);
        }
        return Err(err.into());
    }

    println!("\n{} No problems found", out.marker(Status::Done));
    Ok(())
}
