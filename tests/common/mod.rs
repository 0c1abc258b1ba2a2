//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_metadata(metadata::LUBUNTU);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::metadata;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Metadata documents for testing.
#[allow(dead_code)]
pub mod metadata {
    /// One unstable group with two repositories, a stable group, and a merger
    /// group cascading the unstable one.
    pub const LUBUNTU: &str = r#"
substitutions:
  "$name": name
active_configs:
  lubuntu:
    default:
      type: unstable
      packaging_url: ssh://git@git.example.org/packaging/$name
      packaging_branch_stable: ubuntu/focal
      packaging_branch_unstable: ubuntu/master
      upload_target_stable: ppa:lubuntu-ci/stable
      upload_target_unstable: ppa:lubuntu-ci/unstable
      releases: [focal]
    repositories:
      - name: lxqt-panel
        upstream_url: https://github.com/lxqt/lxqt-panel
        default_branch: ubuntu/master
      - name: pcmanfm-qt
        upstream_url: https://github.com/lxqt/pcmanfm-qt
        default_branch: ubuntu/master
  backports:
    default:
      type: stable
      packaging_url: ssh://git@git.example.org/packaging/$name
      packaging_branch_stable: ubuntu/bionic
      packaging_branch_unstable: ubuntu/master
      upload_target_stable: ppa:lubuntu-ci/backports
      upload_target_unstable: ppa:lubuntu-ci/unstable
      releases: [bionic]
    repositories:
      - name: lxqt-panel
        upstream_url: https://github.com/lxqt/lxqt-panel
  merger:
    default:
      type: merger
      parent: lubuntu
      cascade: [ubuntu/master, ubuntu/focal]
"#;

    /// A record carrying a misspelt key.
    pub const MISSPELT_KEY: &str = r#"
active_configs:
  lubuntu:
    default:
      type: unstable
      packaging_url: ssh://git@git.example.org/packaging/foo
      packaging_branch_stable: ubuntu/focal
      packaging_branch_unstable: ubuntu/master
      upload_target_stable: ppa:lubuntu-ci/stable
      upload_target_unstable: ppa:lubuntu-ci/unstable
      releases: [focal]
    repositories:
      - name: foo
        upstream_ulr: https://example.org/foo
"#;

    /// A record whose package jobs cannot be generated.
    pub const MISSING_UPSTREAM: &str = r#"
active_configs:
  lubuntu:
    default:
      type: unstable
      packaging_url: ssh://git@git.example.org/packaging/foo
      packaging_branch_stable: ubuntu/focal
      packaging_branch_unstable: ubuntu/master
      upload_target_stable: ppa:lubuntu-ci/stable
      upload_target_unstable: ppa:lubuntu-ci/unstable
      releases: [focal]
    repositories:
      - name: good
        upstream_url: https://example.org/good
      - name: no-upstream
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "active_configs: [unclosed";
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// Environment variables the binary reads. Cleared for every command so
/// the developer's environment cannot leak into a test.
const SETTINGS_ENV: &[&str] = &[
    "METADATA_URL",
    "METADATA_REPO_NAME",
    "JENKINS_URL",
    "JENKINS_USER",
    "JENKINS_API_TOKEN",
    "RUST_LOG",
];

/// A temporary directory holding a metadata document.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `ci.conf` with the given content.
    pub fn with_metadata(self, content: &str) -> Self {
        self.temp_dir
            .child("ci.conf")
            .write_str(content)
            .expect("Failed to write metadata file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the metadata file.
    pub fn metadata_path(&self) -> PathBuf {
        self.temp_dir.path().join("ci.conf")
    }

    /// A command running in this fixture's directory, with a clean
    /// environment and plain output.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ci-jobgen");
        cmd.current_dir(self.path());
        for var in SETTINGS_ENV {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// `command()` followed by `subcommand --metadata-file ci.conf`.
    pub fn command_for(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg(subcommand)
            .arg("--metadata-file")
            .arg(self.metadata_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_metadata() {
        let fixture = TestFixture::new().with_metadata("active_configs: {}");
        assert!(fixture.metadata_path().exists());
    }

    #[test]
    fn test_documents_are_valid_yaml() {
        for document in [
            metadata::LUBUNTU,
            metadata::MISSPELT_KEY,
            metadata::MISSING_UPSTREAM,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(document).expect("Document should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        assert!(serde_yaml::from_str::<serde_yaml::Value>(metadata::INVALID_YAML).is_err());
    }
}
