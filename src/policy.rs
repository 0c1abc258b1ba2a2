//! Push capability policy for merger jobs.
//!
//! A merger job pushes the branches it fast-forwards. Against a read-only
//! mirror that push always fails, so the builder swaps in a no-op job when
//! this policy says the packaging URL cannot be written to.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

use crate::error::Result;

/// `user@host:path`, the scp-like form git accepts for SSH remotes.
static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<user>[A-Za-z0-9._-]+)@(?P<host>[A-Za-z0-9.-]+):").expect("scp pattern is valid")
});

/// Decides whether CI can push to a packaging URL.
#[derive(Debug, Clone, Default)]
pub struct PushPolicy {
    read_only_hosts: BTreeSet<String>,
}

impl PushPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats every URL on `host` as read-only, whatever its scheme.
    pub fn with_read_only_host(mut self, host: impl Into<String>) -> Self {
        self.read_only_hosts.insert(host.into().to_ascii_lowercase());
        self
    }

    /// Whether a push to `url` can succeed.
    ///
    /// SSH remotes (`ssh://`, `git+ssh://`, scp-like), `file://` paths and
    /// HTTP(S) URLs carrying a user name are writable. `git://` and
    /// anonymous HTTP(S) are not.
    pub fn is_writable(&self, url: &str) -> Result<bool> {
        if !url.contains("://") {
            if let Some(captures) = SCP_LIKE.captures(url) {
                return Ok(!self.is_read_only_host(&captures["host"]));
            }
        }

        let parsed = Url::parse(url)?;
        if let Some(host) = parsed.host_str() {
            if self.is_read_only_host(host) {
                return Ok(false);
            }
        }

        let writable = match parsed.scheme() {
            "ssh" | "git+ssh" | "ssh+git" | "file" => true,
            "http" | "https" => !parsed.username().is_empty(),
            _ => false,
        };
        Ok(writable)
    }

    fn is_read_only_host(&self, host: &str) -> bool {
        self.read_only_hosts.contains(&host.to_ascii_lowercase())
    }
}
