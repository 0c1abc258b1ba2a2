//! # Job Content Generation
//!
//! The [`JobSpecBuilder`] turns a job kind and, where the kind needs one, a
//! repository record into rendered job content. It reads nothing but its
//! arguments, so the same inputs always produce the same content.
//!
//! | Kind | Record fields used | Template |
//! |------|--------------------|----------|
//! | stable package | `packaging_url`, `packaging_branch_stable`, `upload_target_stable`, `upstream_url`, `name` | `package-stable` |
//! | unstable package | `packaging_url`, `packaging_branch_unstable`, `upload_target_unstable`, `upstream_url`, `name` | `package-unstable` |
//! | merger | `packaging_url`, both branches, `name`, `default_branch` | `merger` or `noop` |
//! | release management | none | `release-mgmt` |
//!
//! A field the kind needs but the record lacks fails only that job, with a
//! [`Error::JobGeneration`] naming the job.

use log::debug;

use crate::cascade::CascadeScript;
use crate::config::RepositoryMetadata;
use crate::error::{Error, Result};
use crate::identity::{JobIdentity, JobType};
use crate::policy::PushPolicy;
use crate::template::{self, Bindings, TemplateSet};

/// What to build. Callers inject the per-iteration inputs (the release
/// under consideration, the effective cascade) here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// A package build for one release.
    Package { job_type: JobType, release: String },
    /// A branch cascade owned by the merger group `group`.
    Merger { group: String, cascade: Vec<String> },
    /// The shared release management body.
    ReleaseMgmt,
}

impl JobKind {
    /// The identity this kind produces for `record`, used in error messages.
    fn label(&self, record: Option<&RepositoryMetadata>) -> String {
        let name = record.map(|r| r.name.as_str()).unwrap_or("<none>");
        match self {
            JobKind::Package { job_type, release } => {
                JobIdentity::package(release, *job_type, name).to_string()
            }
            JobKind::Merger { group, .. } => JobIdentity::merger(group, name).to_string(),
            JobKind::ReleaseMgmt => "release-mgmt".to_string(),
        }
    }
}

/// Renders job content from metadata records.
#[derive(Debug, Clone, Default)]
pub struct JobSpecBuilder {
    templates: TemplateSet,
    push_policy: PushPolicy,
}

impl JobSpecBuilder {
    pub fn new(templates: TemplateSet, push_policy: PushPolicy) -> Self {
        Self {
            templates,
            push_policy,
        }
    }

    /// Renders the content of one job.
    pub fn build(&self, kind: &JobKind, record: Option<&RepositoryMetadata>) -> Result<String> {
        match kind {
            JobKind::ReleaseMgmt => self.templates.render(template::RELEASE_MGMT, &Bindings::new()),
            JobKind::Package { job_type, release } => {
                let record = self.require_record(kind, record)?;
                self.build_package(kind, *job_type, release, record)
            }
            JobKind::Merger { cascade, .. } => {
                let record = self.require_record(kind, record)?;
                self.build_merger(kind, cascade, record)
            }
        }
    }

    fn require_record<'a>(
        &self,
        kind: &JobKind,
        record: Option<&'a RepositoryMetadata>,
    ) -> Result<&'a RepositoryMetadata> {
        record.ok_or_else(|| Error::job_generation(&kind.label(None), "this job kind needs a repository record"))
    }

    fn build_package(
        &self,
        kind: &JobKind,
        job_type: JobType,
        release: &str,
        record: &RepositoryMetadata,
    ) -> Result<String> {
        let upstream_url = required(kind, record, "upstream_url", &record.upstream_url)?;

        let mut bindings = Bindings::new();
        bindings.insert("PACKAGING_URL", record.packaging_url.clone());
        bindings.insert("UPSTREAM_URL", upstream_url.to_string());
        bindings.insert("NAME", record.name.clone());
        bindings.insert("RELEASE", release.to_string());
        let template_name = match job_type {
            JobType::Stable => {
                bindings.insert("PACKAGING_BRANCH_S", record.packaging_branch_stable.clone());
                bindings.insert("UPLOAD_TARGET_S", record.upload_target_stable.clone());
                template::PACKAGE_STABLE
            }
            JobType::Unstable => {
                bindings.insert("PACKAGING_BRANCH_U", record.packaging_branch_unstable.clone());
                bindings.insert("UPLOAD_TARGET_U", record.upload_target_unstable.clone());
                template::PACKAGE_UNSTABLE
            }
        };

        self.templates.render(template_name, &bindings)
    }

    fn build_merger(
        &self,
        kind: &JobKind,
        cascade: &[String],
        record: &RepositoryMetadata,
    ) -> Result<String> {
        let default_branch = required(kind, record, "default_branch", &record.default_branch)?;

        let writable = self
            .push_policy
            .is_writable(&record.packaging_url)
            .map_err(|e| Error::job_generation(&kind.label(Some(record)), e.to_string()))?;
        if !writable {
            debug!(
                "{} is read-only; rendering a no-op merger for {}",
                record.packaging_url, record.name
            );
            let mut bindings = Bindings::new();
            bindings.insert("NAME", record.name.clone());
            return self.templates.render(template::NOOP, &bindings);
        }

        let script = CascadeScript::generate(cascade)
            .map_err(|e| Error::job_generation(&kind.label(Some(record)), e.to_string()))?;

        let mut bindings = Bindings::new();
        bindings.insert("PACKAGING_URL", record.packaging_url.clone());
        bindings.insert("PACKAGING_BRANCH_S", record.packaging_branch_stable.clone());
        bindings.insert("PACKAGING_BRANCH_U", record.packaging_branch_unstable.clone());
        bindings.insert("NAME", record.name.clone());
        bindings.insert("DEFAULT_BRANCH", default_branch.to_string());
        bindings.insert("MERGE_COMMANDS", script.render());
        self.templates.render(template::MERGER, &bindings)
    }
}

fn required<'a>(
    kind: &JobKind,
    record: &RepositoryMetadata,
    field: &str,
    value: &'a Option<String>,
) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        Error::job_generation(
            &kind.label(Some(record)),
            format!("repository '{}' has no '{}'", record.name, field),
        )
    })
}
