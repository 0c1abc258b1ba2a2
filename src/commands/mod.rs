//! # CLI Command Implementations
//!
//! One module per subcommand. Each has an `Args` struct derived with
//! `clap` and an `execute` function that calls into the `ci_jobgen`
//! library.
//!
//! The arguments every metadata-reading command shares live here, in
//! [`MetadataArgs`], together with the helpers that turn them into a
//! resolved document and a job builder.

pub mod completions;
pub mod generate;
pub mod ls;
pub mod tree;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use std::path::PathBuf;

use ci_jobgen::jobspec::JobSpecBuilder;
use ci_jobgen::metadata;
use ci_jobgen::metrics::Metrics;
use ci_jobgen::policy::PushPolicy;
use ci_jobgen::reconcile::{GenerationPolicy, Plan, Reconciler};
use ci_jobgen::resolver::{self, ResolvedMetadata};
use ci_jobgen::settings::MetadataSource;
use ci_jobgen::template::TemplateSet;

/// Where to read the metadata and how to render jobs from it.
#[derive(Args, Debug, Clone)]
pub struct MetadataArgs {
    /// URL of the git repository holding the metadata.
    #[arg(long, value_name = "URL", env = "METADATA_URL")]
    pub metadata_url: Option<String>,

    /// Name of the metadata repository; `<NAME>/ci.conf` is read from the clone.
    #[arg(long, value_name = "NAME", env = "METADATA_REPO_NAME")]
    pub metadata_repo_name: Option<String>,

    /// Read the metadata from a local file instead of cloning it. Takes
    /// precedence over the repository settings.
    #[arg(long, value_name = "FILE")]
    pub metadata_file: Option<PathBuf>,

    /// Directory of `<template>.xml` files overriding the built-in templates.
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Treat packaging URLs on this host as read-only (repeatable).
    #[arg(long = "read-only-host", value_name = "HOST")]
    pub read_only_hosts: Vec<String>,
}

impl MetadataArgs {
    pub fn source(&self) -> Result<MetadataSource> {
        Ok(MetadataSource::from_parts(
            self.metadata_url.clone(),
            self.metadata_repo_name.clone(),
            self.metadata_file.clone(),
        )?)
    }

    /// Fetches and resolves the document, timing both steps.
    pub fn load(&self, source: &MetadataSource, metrics: &mut Metrics) -> Result<ResolvedMetadata> {
        let store = metadata::store_for(source);
        let text = metrics
            .time("fetch", || store.fetch())
            .with_context(|| format!("Failed to fetch metadata from {}", store.location()))?;
        let resolved = metrics.time("resolve", || resolver::resolve_str(&text))?;
        info!(
            "Resolved {} group(s) from {}",
            resolved.configs.len(),
            store.location()
        );
        Ok(resolved)
    }

    pub fn builder(&self) -> Result<JobSpecBuilder> {
        let templates = match &self.templates_dir {
            Some(dir) => TemplateSet::with_overrides(dir)
                .with_context(|| format!("Failed to load templates from {}", dir.display()))?,
            None => TemplateSet::builtin(),
        };
        let policy = self
            .read_only_hosts
            .iter()
            .fold(PushPolicy::new(), |policy, host| policy.with_read_only_host(host.as_str()));
        Ok(JobSpecBuilder::new(templates, policy))
    }

    /// Resolves and plans in one go, for the read-only commands. Jobs that
    /// cannot be generated are left out of the plan.
    pub fn plan(&self) -> Result<Plan> {
        let source = self.source()?;
        let mut metrics = Metrics::new();
        let metadata = self.load(&source, &mut metrics)?;
        let reconciler = Reconciler::new(self.builder()?, GenerationPolicy::SkipAndContinue);
        Ok(reconciler.plan(&metadata)?)
    }
}
