//! # Generate Command Implementation
//!
//! The `generate` subcommand runs the whole pipeline: it fetches and
//! resolves the metadata, plans every job, and applies the plan to Jenkins.
//!
//! - **Dry run**: `--dry-run` prints the plan and never contacts Jenkins.
//! - **Keep going**: `--keep-going` leaves out jobs that cannot be generated,
//!   applies the rest, and still exits with an error listing them.
//! - **Timings**: `--timings` prints how long each phase took.
//!
//! Jenkins settings are checked before the metadata is fetched, so a
//! missing token fails fast.

use anyhow::Result;
use clap::Args;

use ci_jobgen::defaults::TIMERS;
use ci_jobgen::jenkins::JenkinsJobStore;
use ci_jobgen::metrics::Metrics;
use ci_jobgen::output::{OutputConfig, Status};
use ci_jobgen::reconcile::{GenerationPolicy, Plan, Reconciler};
use ci_jobgen::settings::JenkinsSettings;

use super::MetadataArgs;

/// Create or update every job the metadata describes
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub metadata: MetadataArgs,

    /// Base URL of the Jenkins server.
    #[arg(long, value_name = "URL", env = "JENKINS_URL")]
    pub jenkins_url: Option<String>,

    /// Jenkins user the API token belongs to.
    #[arg(long, value_name = "USER", env = "JENKINS_USER")]
    pub jenkins_user: Option<String>,

    /// Jenkins API token.
    #[arg(long, value_name = "TOKEN", env = "JENKINS_API_TOKEN", hide_env_values = true)]
    pub jenkins_api_token: Option<String>,

    /// Print the plan without contacting Jenkins.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip jobs that cannot be generated instead of stopping. The run
    /// still fails once the rest has been applied.
    #[arg(long)]
    pub keep_going: bool,

    /// Print the time spent in each phase.
    #[arg(long)]
    pub timings: bool,
}

/// Execute the `generate` command.
pub fn execute(args: GenerateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let jenkins = if args.dry_run {
        None
    } else {
        Some(JenkinsSettings::from_parts(
            args.jenkins_url.clone(),
            args.jenkins_user.clone(),
            args.jenkins_api_token.clone(),
        )?)
    };
    let source = args.metadata.source()?;

    let mut metrics = Metrics::new();
    println!("{} Reading metadata from {}", out.marker(Status::Fetch), source);
    let metadata = args.metadata.load(&source, &mut metrics)?;

    let policy = if args.keep_going {
        GenerationPolicy::SkipAndContinue
    } else {
        GenerationPolicy::Abort
    };
    let reconciler = Reconciler::new(args.metadata.builder()?, policy);
    let plan = metrics.time("plan", || reconciler.plan(&metadata))?;
    print_skipped(&out, &plan);

    match jenkins {
        None => print_plan(&out, &plan),
        Some(settings) => {
            let store = JenkinsJobStore::new(&settings)?;
            println!(
                "{} Applying {} job(s) to {}",
                out.marker(Status::Plan),
                plan.len(),
                settings.url
            );
            let report = metrics.time("apply", || reconciler.apply(&plan, &store))?;
            for identity in &report.created {
                println!("   {} {}", out.marker(Status::Created), identity);
            }
            for identity in &report.updated {
                println!("   {} {}", out.marker(Status::Updated), identity);
            }
            println!(
                "{} {} created, {} updated, {} view(s) created, {} view membership(s) added",
                out.marker(Status::Done),
                report.created.len(),
                report.updated.len(),
                report.views_created.len(),
                report.memberships_added
            );
        }
    }

    if args.timings {
        print_timings(&out, &metrics);
    }

    match plan.skipped_error() {
        Some(err) => {
            println!("{} {}", out.marker(Status::Failed), err);
            Err(err.into())
        }
        None => Ok(()),
    }
}

fn print_plan(out: &OutputConfig, plan: &Plan) {
    println!(
        "{} Dry run: {} job(s) would be created or updated",
        out.marker(Status::Plan),
        plan.len()
    );
    for job in &plan.jobs {
        println!("   {}  [{}]", job.identity, job.view);
    }
}

fn print_skipped(out: &OutputConfig, plan: &Plan) {
    for skipped in &plan.skipped {
        println!(
            "{} {}: {}",
            out.marker(Status::Skipped),
            skipped.identity,
            skipped.reason
        );
    }
}

fn print_timings(out: &OutputConfig, metrics: &Metrics) {
    println!("\n{} Timings ({}):", out.marker(Status::Timing), TIMERS.join(", "));
    println!("{}", metrics.report());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(metadata_file: Option<PathBuf>) -> GenerateArgs {
        GenerateArgs {
            metadata: MetadataArgs {
                metadata_url: None,
                metadata_repo_name: None,
                metadata_file,
                templates_dir: None,
                read_only_hosts: Vec::new(),
            },
            jenkins_url: None,
            jenkins_user: None,
            jenkins_api_token: None,
            dry_run: false,
            keep_going: false,
            timings: false,
        }
    }

    #[test]
    fn test_missing_jenkins_settings_fail_before_fetch() {
        let err = execute(args(Some(PathBuf::from("/nonexistent/ci.conf"))), "never").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("JENKINS_URL"), "{text}");
        assert!(text.contains("--jenkins-url"), "{text}");
    }

    #[test]
    fn test_dry_run_needs_no_jenkins() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ci.conf");
        std::fs::write(&path, "active_configs: {}\n").unwrap();

        let mut args = args(Some(path));
        args.dry_run = true;
        args.timings = true;
        execute(args, "never").unwrap();
    }
}
