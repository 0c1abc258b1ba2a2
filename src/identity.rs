//! Job identities and view names.
//!
//! Every identity is a pure function of the group name, package name,
//! release and job kind. Nothing here looks at job content or iteration
//! order, so a rerun over the same metadata derives the same names.

use serde::Serialize;
use std::fmt;

use crate::config::ConfigType;

/// View holding every merger job.
pub const MERGER_VIEW: &str = "merger";

/// View holding the release management jobs. Must exist before a run.
pub const MGMT_VIEW: &str = "mgmt";

/// Identity of the aggregate merger management job.
pub const MERGER_MGMT_JOB: &str = "merger";

/// Package build flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Stable,
    Unstable,
}

impl JobType {
    /// Both job types, in the order management jobs are emitted.
    pub const ALL: [JobType; 2] = [JobType::Stable, JobType::Unstable];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Stable => "stable",
            JobType::Unstable => "unstable",
        }
    }

    /// The job type a package group builds, or `None` for merger groups.
    pub fn for_config(config_type: ConfigType) -> Option<JobType> {
        match config_type {
            ConfigType::Stable => Some(JobType::Stable),
            ConfigType::Unstable => Some(JobType::Unstable),
            ConfigType::Merger => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name of a job on the job-execution server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobIdentity(String);

impl JobIdentity {
    /// `{release}_{jobtype}_{name}`
    pub fn package(release: &str, job_type: JobType, name: &str) -> Self {
        Self(format!("{}_{}_{}", release, job_type, name))
    }

    /// `{group}_{name}`, where `group` is the merger group's name.
    pub fn merger(group: &str, name: &str) -> Self {
        Self(format!("{}_{}", group, name))
    }

    /// `mgmt_build_{release}_{jobtype}`
    pub fn release_mgmt(release: &str, job_type: JobType) -> Self {
        Self(format!("mgmt_build_{}_{}", release, job_type))
    }

    /// The single aggregate merger management job.
    pub fn merger_mgmt() -> Self {
        Self(MERGER_MGMT_JOB.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `{release} {jobtype}`
pub fn package_view(release: &str, job_type: JobType) -> String {
    format!("{} {}", release, job_type)
}
