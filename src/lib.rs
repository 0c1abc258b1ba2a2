//! # ci-jobgen
//!
//! This library keeps the jobs of a continuous-integration server in line
//! with a declarative metadata document. It is used by the `ci-jobgen`
//! command-line tool, which fetches the document, derives the jobs, and
//! creates or updates them on a Jenkins server.
//!
//! ## Quick Example
//!
//! ```
//! use ci_jobgen::reconcile::Reconciler;
//! use ci_jobgen::resolver;
//!
//! let metadata = resolver::resolve_str(r#"
//! substitutions:
//!   "$name": name
//! active_configs:
//!   lubuntu:
//!     default:
//!       type: unstable
//!       packaging_url: ssh://git@git.example.org/packaging/$name
//!       packaging_branch_stable: ubuntu/focal
//!       packaging_branch_unstable: ubuntu/master
//!       upload_target_stable: ppa:lubuntu-ci/stable
//!       upload_target_unstable: ppa:lubuntu-ci/unstable
//!       releases: [focal]
//!     repositories:
//!       - name: lxqt-panel
//!         upstream_url: https://github.com/lxqt/lxqt-panel
//! "#).unwrap();
//!
//! let plan = Reconciler::default().plan(&metadata).unwrap();
//! assert_eq!(plan.jobs[0].identity.as_str(), "focal_unstable_lxqt-panel");
//! assert_eq!(plan.jobs[0].view, "focal unstable");
//! // One package job, two release management jobs and the merger aggregate.
//! assert_eq!(plan.len(), 4);
//! ```
//!
//! ## Core Concepts
//!
//! - **Metadata (`metadata`, `config`, `resolver`)**: the document is
//!   fetched from a git repository or a file, parsed, and resolved into
//!   validated groups with defaults inherited and substitutions applied.
//! - **Identities (`identity`)**: job and view names are pure functions of
//!   the group, package, release and job kind.
//! - **Job content (`jobspec`, `template`, `cascade`, `policy`)**: each job
//!   is rendered from a built-in Jenkins template. Merger jobs carry a
//!   generated fast-forward cascade script, or a no-op body when the
//!   packaging repository cannot be pushed to.
//! - **Job stores (`jobstore`, `jenkins`)**: the server is reached through
//!   the `JobStore` trait; `MemoryJobStore` backs tests.
//! - **Reconciliation (`reconcile`)**: a plan of every desired job is
//!   computed before anything is changed, then applied with
//!   create-or-update semantics.
//!
//! ## Execution Flow
//!
//! 1.  **Settings**: the startup parameters the command needs are checked.
//! 2.  **Fetch**: the metadata document is read once.
//! 3.  **Resolve**: the document is validated; any error stops the run.
//! 4.  **Plan**: every job is derived and rendered.
//! 5.  **Apply**: the job store is snapshotted once and the plan applied in
//!     order.

pub mod cascade;
pub mod config;
pub mod defaults;
pub mod error;
pub mod identity;
pub mod jenkins;
pub mod jobspec;
pub mod jobstore;
pub mod metadata;
pub mod metrics;
pub mod output;
pub mod policy;
pub mod reconcile;
pub mod resolver;
pub mod settings;
pub mod suggestions;
pub mod template;
