//! # Metadata Fetching
//!
//! A [`MetadataStore`] produces the text of the metadata document. The
//! [`GitMetadataStore`] clones the metadata repository with the system
//! `git` into a scratch directory, reads `<repo_name>/ci.conf`, and drops
//! the directory again; [`FileMetadataStore`] reads a local file.
//!
//! Using the system `git` means SSH keys, credential helpers and anything
//! else configured in `~/.gitconfig` apply to the clone.

use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::defaults::{METADATA_CLONE_DEPTH, METADATA_FILENAME};
use crate::error::{Error, Result};
use crate::settings::MetadataSource;

/// Source of the metadata document text.
pub trait MetadataStore {
    /// Reads the whole document.
    fn fetch(&self) -> Result<String>;

    /// Where the document comes from, for messages.
    fn location(&self) -> String;
}

/// Reads `ci.conf` from a fresh clone of the metadata repository.
#[derive(Debug, Clone)]
pub struct GitMetadataStore {
    url: String,
    repo_name: String,
}

impl GitMetadataStore {
    pub fn new(url: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            repo_name: repo_name.into(),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Metadata {
            url: self.url.clone(),
            message: message.into(),
        }
    }
}

impl MetadataStore for GitMetadataStore {
    fn fetch(&self) -> Result<String> {
        let scratch = tempfile::Builder::new().prefix("ci-jobgen-").tempdir()?;
        let checkout = scratch.path().join(&self.repo_name);
        info!("Cloning metadata from {}", self.url);

        let output = Command::new("git")
            .arg("clone")
            .arg(format!("--depth={}", METADATA_CLONE_DEPTH))
            .arg("--quiet")
            .arg(&self.url)
            .arg(&checkout)
            .output()
            .map_err(|e| self.error(format!("could not run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("Could not read from remote repository")
            {
                format!(
                    "authentication failed; check the SSH key or git credentials for this \
                     repository\n{}",
                    stderr.trim()
                )
            } else {
                stderr.trim().to_string()
            };
            return Err(self.error(message));
        }

        let path = checkout.join(METADATA_FILENAME);
        debug!("Reading {}", path.display());
        fs::read_to_string(&path).map_err(|e| {
            self.error(format!(
                "{}/{} could not be read: {}",
                self.repo_name, METADATA_FILENAME, e
            ))
        })
        // `scratch` is removed here.
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// Reads the metadata document from a local path.
#[derive(Debug, Clone)]
pub struct FileMetadataStore {
    path: PathBuf,
}

impl FileMetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetadataStore for FileMetadataStore {
    fn fetch(&self) -> Result<String> {
        debug!("Reading {}", self.path.display());
        fs::read_to_string(&self.path).map_err(|e| Error::Metadata {
            url: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// The store for a configured source.
pub fn store_for(source: &MetadataSource) -> Box<dyn MetadataStore> {
    match source {
        MetadataSource::Git { url, repo_name } => Box::new(GitMetadataStore::new(url, repo_name)),
        MetadataSource::File(path) => Box::new(FileMetadataStore::new(path)),
    }
}
