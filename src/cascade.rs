//! Branch cascade script generation.
//!
//! A cascade `[b0, b1, ..., bn]` keeps each branch a fast-forward of the
//! one before it. The generated script checks out `b0`, then for every
//! following branch:
//!
//! 1.  checks it out, tracking the remote branch when one exists, or
//!     creates it from the current position;
//! 2.  fast-forward merges the previous branch into it, failing if the
//!     histories have diverged;
//! 3.  pushes it, creating the remote branch if needed.
//!
//! Branch names are validated before anything is generated, and a branch
//! may appear only once, so no step ever merges a branch into itself.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static BRANCH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/+-]*$").expect("branch pattern is valid")
});

/// Why a cascade could not be turned into a script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CascadeError {
    #[error("cascade is empty")]
    Empty,

    #[error("invalid branch name '{0}' in cascade")]
    InvalidBranch(String),

    #[error("branch '{0}' appears more than once in cascade")]
    DuplicateBranch(String),
}

/// One action of a cascade script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    /// Check out an existing branch.
    Checkout(String),
    /// Check out a branch, creating it from the current position if needed.
    CheckoutOrCreate(String),
    /// Fast-forward `into` to `from`.
    FastForward { from: String, into: String },
    /// Push a branch and set its upstream.
    Push(String),
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeStep::Checkout(branch) => write!(f, "git checkout {}", branch),
            CascadeStep::CheckoutOrCreate(branch) => {
                write!(f, "git checkout {0} || git checkout -b {0}", branch)
            }
            CascadeStep::FastForward { from, .. } => write!(f, "git merge --ff-only {}", from),
            CascadeStep::Push(branch) => write!(f, "git push --set-upstream origin {}", branch),
        }
    }
}

/// An ordered list of cascade steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeScript {
    steps: Vec<CascadeStep>,
}

impl CascadeScript {
    /// Builds the script for `branches`, first branch first.
    pub fn generate<S: AsRef<str>>(branches: &[S]) -> Result<Self, CascadeError> {
        let (first, rest) = branches.split_first().ok_or(CascadeError::Empty)?;

        let mut seen = BTreeSet::new();
        for branch in branches {
            let branch = branch.as_ref();
            if !BRANCH_NAME.is_match(branch) || branch.contains("..") {
                return Err(CascadeError::InvalidBranch(branch.to_string()));
            }
            if !seen.insert(branch) {
                return Err(CascadeError::DuplicateBranch(branch.to_string()));
            }
        }

        let mut steps = Vec::with_capacity(1 + rest.len() * 3);
        steps.push(CascadeStep::Checkout(first.as_ref().to_string()));
        let mut previous = first.as_ref();
        for branch in rest {
            let branch = branch.as_ref();
            steps.push(CascadeStep::CheckoutOrCreate(branch.to_string()));
            steps.push(CascadeStep::FastForward {
                from: previous.to_string(),
                into: branch.to_string(),
            });
            steps.push(CascadeStep::Push(branch.to_string()));
            previous = branch;
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[CascadeStep] {
        &self.steps
    }

    /// Shell text for the job's build step.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.steps.len() + 1);
        lines.push("set -e".to_string());
        lines.extend(self.steps.iter().map(ToString::to_string));
        lines.join("\n")
    }
}
