//! # Ls Command Implementation
//!
//! The `ls` subcommand prints the identity of every job the metadata
//! describes, one per line and in plan order, so the output can be piped.
//! Jobs that cannot be generated are left out with a warning.
//!
//! This command is read-only and never contacts Jenkins.

use anyhow::Result;
use clap::{Args, ValueEnum};
use log::warn;

use ci_jobgen::reconcile::{JobCategory, PlannedJob};

use super::MetadataArgs;

/// List the jobs the metadata describes
#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub metadata: MetadataArgs,

    /// Only list jobs in this view (e.g. "focal unstable").
    #[arg(long, value_name = "VIEW")]
    pub view: Option<String>,

    /// Only list jobs of this kind.
    #[arg(short, long, value_enum)]
    pub kind: Option<KindFilter>,

    /// Show only the number of jobs.
    #[arg(long)]
    pub count: bool,
}

/// Job kinds accepted by `--kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    /// Stable package builds
    Stable,
    /// Unstable package builds
    Unstable,
    /// Branch cascade jobs
    Merger,
    /// Release management jobs
    Mgmt,
}

impl From<KindFilter> for JobCategory {
    fn from(kind: KindFilter) -> Self {
        match kind {
            KindFilter::Stable => JobCategory::Stable,
            KindFilter::Unstable => JobCategory::Unstable,
            KindFilter::Merger => JobCategory::Merger,
            KindFilter::Mgmt => JobCategory::Mgmt,
        }
    }
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs) -> Result<()> {
    let plan = args.metadata.plan()?;
    for skipped in &plan.skipped {
        warn!("{}", skipped.reason);
    }

    let jobs: Vec<&PlannedJob> = plan
        .jobs
        .iter()
        .filter(|job| matches(job, args.view.as_deref(), args.kind))
        .collect();

    if args.count {
        println!("{}", jobs.len());
    } else {
        for job in jobs {
            println!("{}", job.identity);
        }
    }
    Ok(())
}

fn matches(job: &PlannedJob, view: Option<&str>, kind: Option<KindFilter>) -> bool {
    view.is_none_or(|view| job.view == view)
        && kind.is_none_or(|kind| job.category() == JobCategory::from(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci_jobgen::identity::{JobIdentity, JobType};
    use ci_jobgen::jobspec::JobKind;

    fn job(job_type: JobType) -> PlannedJob {
        PlannedJob {
            identity: JobIdentity::package("focal", job_type, "foo"),
            kind: JobKind::Package {
                job_type,
                release: "focal".to_string(),
            },
            view: format!("focal {}", job_type),
            content: String::new(),
        }
    }

    #[test]
    fn test_matches_without_filters() {
        assert!(matches(&job(JobType::Stable), None, None));
    }

    #[test]
    fn test_matches_by_view() {
        let job = job(JobType::Unstable);
        assert!(matches(&job, Some("focal unstable"), None));
        assert!(!matches(&job, Some("focal stable"), None));
    }

    #[test]
    fn test_matches_by_kind() {
        let job = job(JobType::Stable);
        assert!(matches(&job, None, Some(KindFilter::Stable)));
        assert!(!matches(&job, None, Some(KindFilter::Mgmt)));
    }
}
