//! # Terminal Output
//!
//! Status markers for the lines the CLI prints. With colour enabled a
//! marker is an emoji; without it, a bracketed word that stays readable in
//! CI logs and pipes.
//!
//! Colour follows `--color=always|never|auto`. In `auto` mode it is off when
//! `NO_COLOR` is set, `CLICOLOR=0`, `TERM=dumb`, or stdout is not a
//! terminal (unless `CLICOLOR_FORCE` is set to a non-zero value).
//!
//! ## Usage
//!
//! ```
//! use ci_jobgen::output::{OutputConfig, Status};
//!
//! let out = OutputConfig::plain();
//! assert_eq!(out.marker(Status::Done), "[OK]");
//! println!("{} Metadata is valid", out.marker(Status::Done));
//! ```

use std::env;

/// Output configuration for controlling colour and emoji markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether colours and emoji markers should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from the environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colour on (overrides NO_COLOR)
    /// - `--color=never`: Force colour off
    /// - `--color=auto`: Detect based on environment
    ///
    /// The flag is matched case-insensitively; any other value behaves
    /// like `auto`. In auto mode, colour is disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE` is non-zero)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_ascii_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => detect_color_support(),
        };
        Self { use_color }
    }

    /// Create a configuration with colour always disabled.
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// Returns the marker to prefix a status line with.
    ///
    /// When colour is enabled this is the emoji for `status`; otherwise it
    /// is the bracketed plain-text word, e.g. `[OK]` for [`Status::Done`].
    pub fn marker(&self, status: Status) -> &'static str {
        let (emoji, plain) = status.markers();
        if self.use_color {
            emoji
        } else {
            plain
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Detect whether colour output is supported based on the environment.
fn detect_color_support() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}

/// Kinds of status line printed by the CLI.
///
/// Each kind has an emoji and a plain-text marker; [`OutputConfig::marker`]
/// picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Fetching or reading input.
    Fetch,
    /// A computed plan or listing.
    Plan,
    /// A job was created.
    Created,
    /// A job was updated.
    Updated,
    /// A job was skipped.
    Skipped,
    /// The step finished successfully.
    Done,
    /// The step failed.
    Failed,
    /// Timing output.
    Timing,
}

impl Status {
    /// The `(emoji, plain)` marker pair.
    fn markers(self) -> (&'static str, &'static str) {
        match self {
            Status::Fetch => ("📥", "[FETCH]"),
            Status::Plan => ("📋", "[PLAN]"),
            Status::Created => ("✨", "[CREATE]"),
            Status::Updated => ("🔄", "[UPDATE]"),
            Status::Skipped => ("⚠️ ", "[SKIP]"),
            Status::Done => ("✅", "[OK]"),
            Status::Failed => ("❌", "[FAIL]"),
            Status::Timing => ("⏱️ ", "[TIME]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_flag_always_and_never() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(OutputConfig::from_env_and_flag("ALWAYS").use_color);
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    fn test_marker_with_color() {
        let config = OutputConfig { use_color: true };
        assert_eq!(config.marker(Status::Done), "✅");
    }

    #[test]
    fn test_marker_without_color() {
        let config = OutputConfig::plain();
        assert_eq!(config.marker(Status::Done), "[OK]");
        assert_eq!(config.marker(Status::Skipped), "[SKIP]");
    }
}
