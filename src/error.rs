//! # Error Handling
//!
//! This module defines the centralized error type for `ci-jobgen`. It uses
//! `thiserror` to build a single `Error` enum covering every failure mode of
//! a run, with messages that name the offending group, record, key or job.
//!
//! The variants follow the order in which a run can fail:
//!
//! - **Configuration**: a startup parameter is missing or malformed. Raised
//!   before any work is done.
//! - **Schema**: the metadata document is invalid. Raised before any job
//!   store mutation; the document is never partially applied.
//! - **JobGeneration**: a single job could not be rendered from its record.
//! - **SkippedJobs**: the run continued past job-generation errors and must
//!   still report failure.
//! - **Metadata** / **JobStore**: a remote call failed. There is no retry.
//!
//! The `Result` alias is used throughout the library.

use thiserror::Error;

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

/// Main error type for ci-jobgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required startup parameter is missing or invalid.
    #[error("Configuration error: {message}{}", hint_suffix(hint))]
    Configuration {
        message: String,
        /// Optional hint naming the flag or environment variable to set
        hint: Option<String>,
    },

    /// The metadata document failed schema validation.
    ///
    /// `group` and `record` are empty when the problem is document-wide.
    #[error("Schema validation error{}: {message}{}", schema_location(group, record), hint_suffix(hint))]
    Schema {
        group: String,
        record: String,
        message: String,
        /// Optional hint, such as the closest valid key
        hint: Option<String>,
    },

    /// A job could not be generated from its metadata record.
    #[error("Job generation error for {identity}: {message}")]
    JobGeneration { identity: String, message: String },

    /// Jobs were skipped because of generation errors; the rest was applied.
    #[error("{count} job(s) skipped because of generation errors: {}", identities.join(", "))]
    SkippedJobs {
        count: usize,
        identities: Vec<String>,
    },

    /// A job template could not be rendered.
    ///
    /// May include the name of the problematic variable when applicable.
    #[error("Template processing error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// The metadata document could not be fetched.
    #[error("Metadata fetch error for {url}: {message}")]
    Metadata { url: String, message: String },

    /// A job store call failed or was rejected.
    #[error("Job store error during {operation} of '{target}': {message}")]
    JobStore {
        operation: String,
        target: String,
        message: String,
    },

    /// A timer was used incorrectly.
    #[error("Metrics error: {message}")]
    Metrics { message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

fn schema_location(group: &str, record: &str) -> String {
    match (group.is_empty(), record.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!(" in group '{}'", group),
        (false, false) => format!(" in group '{}', repository '{}'", group, record),
    }
}

impl Error {
    /// Shorthand for a document-wide or group-level schema error.
    pub fn schema(group: &str, record: &str, message: impl Into<String>) -> Self {
        Error::Schema {
            group: group.to_string(),
            record: record.to_string(),
            message: message.into(),
            hint: None,
        }
    }

    /// Shorthand for a job generation error.
    pub fn job_generation(identity: &str, message: impl Into<String>) -> Self {
        Error::JobGeneration {
            identity: identity.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error is scoped to a single job and may be skipped.
    pub fn is_job_scoped(&self) -> bool {
        matches!(self, Error::JobGeneration { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
