//! Startup configuration.
//!
//! Values arrive from command-line flags, which `clap` backs with the
//! environment variables of the same name. This module only checks that
//! the values a command needs are present and well formed; an empty value
//! counts as missing. Every failure is an [`Error::Configuration`] whose
//! hint names the flag and the variable.

use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::error::{Error, Result};
use crate::suggestions;

/// Where the metadata document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// A git repository whose `<repo_name>/ci.conf` holds the document.
    Git { url: String, repo_name: String },
    /// A document on the local filesystem.
    File(PathBuf),
}

impl MetadataSource {
    /// Picks the source from the supplied values. A file wins over a
    /// repository; a repository needs both its URL and its name.
    pub fn from_parts(
        url: Option<String>,
        repo_name: Option<String>,
        file: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(path) = file {
            return Ok(MetadataSource::File(path));
        }
        let url = require(url, "METADATA_URL is not set", "--metadata-url", "METADATA_URL")?;
        let repo_name = require(
            repo_name,
            "METADATA_REPO_NAME is not set",
            "--metadata-repo-name",
            "METADATA_REPO_NAME",
        )?;
        if repo_name.contains('/') || repo_name.contains('\\') || repo_name == ".." {
            return Err(Error::Configuration {
                message: format!("METADATA_REPO_NAME '{}' is not a directory name", repo_name),
                hint: None,
            });
        }
        Ok(MetadataSource::Git { url, repo_name })
    }
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataSource::Git { url, repo_name } => write!(f, "{} ({})", url, repo_name),
            MetadataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// How to reach the Jenkins server.
#[derive(Clone)]
pub struct JenkinsSettings {
    pub url: Url,
    pub user: String,
    pub api_token: String,
}

impl JenkinsSettings {
    pub fn from_parts(
        url: Option<String>,
        user: Option<String>,
        api_token: Option<String>,
    ) -> Result<Self> {
        let url = require(url, "JENKINS_URL is not set", "--jenkins-url", "JENKINS_URL")?;
        let user = require(user, "JENKINS_USER is not set", "--jenkins-user", "JENKINS_USER")?;
        let api_token = require(
            api_token,
            "JENKINS_API_TOKEN is not set",
            "--jenkins-api-token",
            "JENKINS_API_TOKEN",
        )?;

        let url = Url::parse(&url).map_err(|e| Error::Configuration {
            message: format!("JENKINS_URL '{}' is not a valid URL: {}", url, e),
            hint: None,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration {
                message: format!("JENKINS_URL must use http or https, not '{}'", url.scheme()),
                hint: None,
            });
        }

        Ok(Self {
            url,
            user,
            api_token,
        })
    }
}

impl fmt::Debug for JenkinsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsSettings")
            .field("url", &self.url.as_str())
            .field("user", &self.user)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

fn require(value: Option<String>, message: &str, flag: &str, env: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Configuration {
            message: message.to_string(),
            hint: Some(suggestions::missing_setting(flag, env)),
        }),
    }
}
