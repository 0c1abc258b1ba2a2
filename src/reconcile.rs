//! # Reconciliation
//!
//! A run is split in two:
//!
//! 1.  [`Reconciler::plan`] derives every job the metadata calls for, with
//!     its identity, view and rendered content. It makes no remote calls,
//!     so every validation and generation failure surfaces before the job
//!     store is touched.
//! 2.  [`Reconciler::apply`] takes one snapshot of the store and walks the
//!     plan in order: jobs in the snapshot are updated, the rest are
//!     created, and each job is then placed in its view. Views are created
//!     the first time they are referenced, except `mgmt`, which must
//!     already exist.
//!
//! Plan order:
//!
//! - merger jobs, one per repository of each merger group's parent;
//! - package jobs, per package group, repository and release;
//! - release management jobs, per observed release (sorted) and job type;
//! - the aggregate `merger` management job.
//!
//! Applying the same plan twice leaves the store as the first application
//! did: the second run only updates jobs in place.

use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{ConfigType, RepositoryMetadata};
use crate::error::{Error, Result};
use crate::identity::{self, JobIdentity, JobType, MERGER_VIEW, MGMT_VIEW};
use crate::jobspec::{JobKind, JobSpecBuilder};
use crate::jobstore::{JobStore, ViewHandle};
use crate::resolver::ResolvedMetadata;

/// What to do when a single job cannot be generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationPolicy {
    /// Fail the run before anything is applied.
    #[default]
    Abort,
    /// Leave the job out, apply the rest, then fail the run.
    SkipAndContinue,
}

/// Coarse job category, for filtering listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobCategory {
    Stable,
    Unstable,
    Merger,
    Mgmt,
}

impl JobCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCategory::Stable => "stable",
            JobCategory::Unstable => "unstable",
            JobCategory::Merger => "merger",
            JobCategory::Mgmt => "mgmt",
        }
    }
}

/// A job the run should leave on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJob {
    pub identity: JobIdentity,
    pub kind: JobKind,
    pub view: String,
    pub content: String,
}

impl PlannedJob {
    pub fn category(&self) -> JobCategory {
        match &self.kind {
            JobKind::Package {
                job_type: JobType::Stable,
                ..
            } => JobCategory::Stable,
            JobKind::Package {
                job_type: JobType::Unstable,
                ..
            } => JobCategory::Unstable,
            JobKind::Merger { .. } => JobCategory::Merger,
            JobKind::ReleaseMgmt => JobCategory::Mgmt,
        }
    }
}

/// A job left out of the plan because its content could not be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedJob {
    pub identity: String,
    pub reason: String,
}

/// The desired jobs of one run, in application order.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub jobs: Vec<PlannedJob>,
    /// Every release a package job was derived for.
    pub releases: BTreeSet<String>,
    pub skipped: Vec<SkippedJob>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job(&self, identity: &str) -> Option<&PlannedJob> {
        self.jobs.iter().find(|job| job.identity.as_str() == identity)
    }

    /// Planned jobs grouped by view, views sorted by name, jobs in plan order.
    pub fn views(&self) -> BTreeMap<&str, Vec<&PlannedJob>> {
        let mut views: BTreeMap<&str, Vec<&PlannedJob>> = BTreeMap::new();
        for job in &self.jobs {
            views.entry(job.view.as_str()).or_default().push(job);
        }
        views
    }

    /// The error a run with skipped jobs ends with, if any were skipped.
    pub fn skipped_error(&self) -> Option<Error> {
        if self.skipped.is_empty() {
            return None;
        }
        Some(Error::SkippedJobs {
            count: self.skipped.len(),
            identities: self.skipped.iter().map(|s| s.identity.clone()).collect(),
        })
    }
}

/// What [`Reconciler::apply`] did to the job store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub views_created: Vec<String>,
    pub memberships_added: usize,
}

/// Derives and applies the jobs for a set of resolved metadata.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    builder: JobSpecBuilder,
    policy: GenerationPolicy,
}

impl Reconciler {
    pub fn new(builder: JobSpecBuilder, policy: GenerationPolicy) -> Self {
        Self { builder, policy }
    }

    pub fn policy(&self) -> GenerationPolicy {
        self.policy
    }

    /// Plans, applies, and fails if any job was skipped.
    pub fn reconcile(
        &self,
        metadata: &ResolvedMetadata,
        store: &dyn JobStore,
    ) -> Result<ReconcileReport> {
        let plan = self.plan(metadata)?;
        let report = self.apply(&plan, store)?;
        match plan.skipped_error() {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Derives every job for `metadata` without touching any job store.
    pub fn plan(&self, metadata: &ResolvedMetadata) -> Result<Plan> {
        let mut planner = Planner {
            builder: &self.builder,
            policy: self.policy,
            plan: Plan::default(),
            seen: BTreeMap::new(),
        };

        for merger in metadata.of_type(ConfigType::Merger) {
            let parent = metadata.parent_of(merger)?;
            for record in &parent.repositories {
                let identity = JobIdentity::merger(&merger.name, &record.name);
                let cascade = record.cascade.as_ref().or(merger.cascade.as_ref());
                let kind = match cascade {
                    Some(cascade) => Ok(JobKind::Merger {
                        group: merger.name.clone(),
                        cascade: cascade.clone(),
                    }),
                    None => Err(Error::job_generation(
                        identity.as_str(),
                        format!(
                            "repository '{}' has no 'cascade' and merger group '{}' has no default",
                            record.name, merger.name
                        ),
                    )),
                };
                planner.add(&merger.name, identity, kind, Some(record), MERGER_VIEW)?;
            }
        }

        for group in &metadata.configs {
            let Some(job_type) = JobType::for_config(group.config_type) else {
                continue;
            };
            for record in &group.repositories {
                for release in &record.releases {
                    planner.plan.releases.insert(release.clone());
                    let identity = JobIdentity::package(release, job_type, &record.name);
                    let kind = JobKind::Package {
                        job_type,
                        release: release.clone(),
                    };
                    let view = identity::package_view(release, job_type);
                    planner.add(&group.name, identity, Ok(kind), Some(record), &view)?;
                }
            }
        }

        let mgmt_content = self.builder.build(&JobKind::ReleaseMgmt, None)?;
        let releases: Vec<String> = planner.plan.releases.iter().cloned().collect();
        for release in &releases {
            for job_type in JobType::ALL {
                planner.push_mgmt(
                    JobIdentity::release_mgmt(release, job_type),
                    mgmt_content.clone(),
                )?;
            }
        }
        planner.push_mgmt(JobIdentity::merger_mgmt(), mgmt_content)?;

        let plan = planner.plan;
        info!(
            "Planned {} job(s) across {} release(s)",
            plan.len(),
            plan.releases.len()
        );
        Ok(plan)
    }

    /// Brings `store` in line with `plan`.
    pub fn apply(&self, plan: &Plan, store: &dyn JobStore) -> Result<ReconcileReport> {
        let existing = store.list_job_identities()?;
        let mut views = store.list_views()?;
        debug!(
            "Job store has {} job(s) and {} view(s)",
            existing.len(),
            views.len()
        );

        if !views.contains(MGMT_VIEW) {
            return Err(Error::JobStore {
                operation: "check view".to_string(),
                target: MGMT_VIEW.to_string(),
                message: "view does not exist; create it on the server before the first run"
                    .to_string(),
            });
        }

        let mut report = ReconcileReport::default();
        for job in &plan.jobs {
            let identity = job.identity.as_str();
            if existing.contains(identity) {
                debug!("Updating {}", identity);
                let handle = store.get_job(identity)?;
                store.update_job(&handle, &job.content)?;
                report.updated.push(identity.to_string());
            } else {
                debug!("Creating {}", identity);
                store.create_job(identity, &job.content)?;
                report.created.push(identity.to_string());
            }

            let view = if views.contains(&job.view) {
                ViewHandle {
                    name: job.view.clone(),
                }
            } else {
                debug!("Creating view '{}'", job.view);
                let handle = store.create_view(&job.view)?;
                views.insert(job.view.clone());
                report.views_created.push(job.view.clone());
                handle
            };
            if !store.view_contains(&view, identity)? {
                store.add_job_to_view(&view, identity)?;
                report.memberships_added += 1;
            }
        }

        info!(
            "Applied {} job(s): {} created, {} updated",
            plan.len(),
            report.created.len(),
            report.updated.len()
        );
        Ok(report)
    }
}

struct Planner<'a> {
    builder: &'a JobSpecBuilder,
    policy: GenerationPolicy,
    plan: Plan,
    /// Identity -> group that planned it.
    seen: BTreeMap<String, String>,
}

impl Planner<'_> {
    fn add(
        &mut self,
        group: &str,
        identity: JobIdentity,
        kind: Result<JobKind>,
        record: Option<&RepositoryMetadata>,
        view: &str,
    ) -> Result<()> {
        let record_name = record.map(|r| r.name.as_str()).unwrap_or_default();
        self.claim(group, record_name, &identity)?;

        let built = kind.and_then(|kind| {
            let content = self.builder.build(&kind, record)?;
            Ok((kind, content))
        });
        match built {
            Ok((kind, content)) => {
                debug!("Planned {} in view '{}'", identity, view);
                self.plan.jobs.push(PlannedJob {
                    identity,
                    kind,
                    view: view.to_string(),
                    content,
                });
                Ok(())
            }
            Err(err) if err.is_job_scoped() && self.policy == GenerationPolicy::SkipAndContinue => {
                warn!("Skipping {}: {}", identity, err);
                self.plan.skipped.push(SkippedJob {
                    identity: identity.to_string(),
                    reason: err.to_string(),
                });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn push_mgmt(&mut self, identity: JobIdentity, content: String) -> Result<()> {
        self.claim("", "", &identity)?;
        self.plan.jobs.push(PlannedJob {
            identity,
            kind: JobKind::ReleaseMgmt,
            view: MGMT_VIEW.to_string(),
            content,
        });
        Ok(())
    }

    fn claim(&mut self, group: &str, record: &str, identity: &JobIdentity) -> Result<()> {
        if let Some(first) = self.seen.get(identity.as_str()) {
            let message = if first.is_empty() {
                format!("job '{}' is already planned as a management job", identity)
            } else {
                format!("job '{}' is already planned by group '{}'", identity, first)
            };
            return Err(Error::schema(group, record, message));
        }
        self.seen.insert(identity.to_string(), group.to_string());
        Ok(())
    }
}
