//! # Job Store Interface
//!
//! The job-execution server is reached only through the [`JobStore`]
//! trait. This keeps the reconciler independent of the server's API and
//! lets tests run it against [`MemoryJobStore`], an in-memory store with a
//! call log, in place of a live server.
//!
//! The production implementation is [`crate::jenkins::JenkinsJobStore`].
//!
//! All identities and view names are plain strings. Handles are small
//! value types returned by lookups and creations so that implementations
//! can carry whatever they need to address the object again.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

/// A job known to exist on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub name: String,
}

/// A view known to exist on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    pub name: String,
}

/// Operations the reconciler needs from a job-execution server.
pub trait JobStore: Send + Sync {
    /// Names of every job on the server.
    fn list_job_identities(&self) -> Result<BTreeSet<String>>;

    /// Looks up an existing job.
    fn get_job(&self, identity: &str) -> Result<JobHandle>;

    /// Creates a job with the given content.
    fn create_job(&self, identity: &str, content: &str) -> Result<JobHandle>;

    /// Replaces the content of an existing job.
    fn update_job(&self, job: &JobHandle, content: &str) -> Result<()>;

    /// Names of every view on the server.
    fn list_views(&self) -> Result<BTreeSet<String>>;

    /// Creates an empty view.
    fn create_view(&self, name: &str) -> Result<ViewHandle>;

    /// Whether `identity` is a member of `view`.
    fn view_contains(&self, view: &ViewHandle, identity: &str) -> Result<bool>;

    /// Adds `identity` to `view`. Adding an existing member is a no-op.
    fn add_job_to_view(&self, view: &ViewHandle, identity: &str) -> Result<()>;
}

/// A mutating call recorded by [`MemoryJobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateJob(String),
    UpdateJob(String),
    CreateView(String),
    AddToView { view: String, job: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    jobs: BTreeMap<String, String>,
    views: BTreeMap<String, BTreeSet<String>>,
    calls: Vec<StoreCall>,
}

/// An in-memory job store.
///
/// Creating a job or view that already exists is an error, as it is on a
/// real server; this is what makes duplicate creates visible in tests.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    state: Mutex<MemoryState>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already has the given (empty) views.
    pub fn with_views<I, S>(views: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            for view in views {
                state.views.insert(view.into(), BTreeSet::new());
            }
        }
        store
    }

    /// Content of a job, if it exists.
    pub fn job(&self, identity: &str) -> Option<String> {
        self.lock().ok()?.jobs.get(identity).cloned()
    }

    /// Every job and its content.
    pub fn jobs(&self) -> BTreeMap<String, String> {
        self.lock().map(|s| s.jobs.clone()).unwrap_or_default()
    }

    /// Every view and its members.
    pub fn views(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.lock().map(|s| s.views.clone()).unwrap_or_default()
    }

    /// Members of a view, if it exists.
    pub fn view_members(&self, view: &str) -> Option<BTreeSet<String>> {
        self.lock().ok()?.views.get(view).cloned()
    }

    /// Mutating calls in the order they were made.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Forgets the call log, keeping jobs and views.
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.lock() {
            state.calls.clear();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "memory job store".to_string(),
        })
    }
}

fn not_found(operation: &str, target: &str, what: &str) -> Error {
    Error::JobStore {
        operation: operation.to_string(),
        target: target.to_string(),
        message: format!("{} does not exist", what),
    }
}

fn already_exists(operation: &str, target: &str, what: &str) -> Error {
    Error::JobStore {
        operation: operation.to_string(),
        target: target.to_string(),
        message: format!("{} already exists", what),
    }
}

impl JobStore for MemoryJobStore {
    fn list_job_identities(&self) -> Result<BTreeSet<String>> {
        Ok(self.lock()?.jobs.keys().cloned().collect())
    }

    fn get_job(&self, identity: &str) -> Result<JobHandle> {
        if self.lock()?.jobs.contains_key(identity) {
            Ok(JobHandle {
                name: identity.to_string(),
            })
        } else {
            Err(not_found("get job", identity, "job"))
        }
    }

    fn create_job(&self, identity: &str, content: &str) -> Result<JobHandle> {
        let mut state = self.lock()?;
        if state.jobs.contains_key(identity) {
            return Err(already_exists("create job", identity, "job"));
        }
        state.jobs.insert(identity.to_string(), content.to_string());
        state.calls.push(StoreCall::CreateJob(identity.to_string()));
        Ok(JobHandle {
            name: identity.to_string(),
        })
    }

    fn update_job(&self, job: &JobHandle, content: &str) -> Result<()> {
        let mut state = self.lock()?;
        match state.jobs.get_mut(&job.name) {
            Some(existing) => *existing = content.to_string(),
            None => return Err(not_found("update job", &job.name, "job")),
        }
        state.calls.push(StoreCall::UpdateJob(job.name.clone()));
        Ok(())
    }

    fn list_views(&self) -> Result<BTreeSet<String>> {
        Ok(self.lock()?.views.keys().cloned().collect())
    }

    fn create_view(&self, name: &str) -> Result<ViewHandle> {
        let mut state = self.lock()?;
        if state.views.contains_key(name) {
            return Err(already_exists("create view", name, "view"));
        }
        state.views.insert(name.to_string(), BTreeSet::new());
        state.calls.push(StoreCall::CreateView(name.to_string()));
        Ok(ViewHandle {
            name: name.to_string(),
        })
    }

    fn view_contains(&self, view: &ViewHandle, identity: &str) -> Result<bool> {
        let state = self.lock()?;
        let members = state
            .views
            .get(&view.name)
            .ok_or_else(|| not_found("read view", &view.name, "view"))?;
        Ok(members.contains(identity))
    }

    fn add_job_to_view(&self, view: &ViewHandle, identity: &str) -> Result<()> {
        let mut state = self.lock()?;
        if !state.jobs.contains_key(identity) {
            return Err(not_found("add to view", identity, "job"));
        }
        let members = state
            .views
            .get_mut(&view.name)
            .ok_or_else(|| not_found("add to view", &view.name, "view"))?;
        if members.insert(identity.to_string()) {
            state.calls.push(StoreCall::AddToView {
                view: view.name.clone(),
                job: identity.to_string(),
            });
        }
        Ok(())
    }
}
