//! # Completions Command Implementation
//!
//! This module implements the `completions` subcommand, which writes a
//! shell completion script for `ci-jobgen` to stdout. The script is
//! generated with `clap_complete` from the same `clap` definitions the
//! binary parses with, so every subcommand and flag completes.
//!
//! ## Supported Shells
//!
//! - **Bash**: Add to `.bashrc` or save under `bash-completion/completions/`
//! - **Zsh**: Save as `_ci-jobgen` somewhere on `fpath`
//! - **Fish**: Save to `~/.config/fish/completions/`
//! - **PowerShell**: Add to the PowerShell profile
//! - **Elvish**: Source from `rc.elv`
//!
//! ## Example
//!
//! ```bash
//! # Generate and install bash completions
//! ci-jobgen completions bash > ~/.local/share/bash-completion/completions/ci-jobgen
//!
//! # Generate zsh completions
//! ci-jobgen completions zsh > ~/.zfunc/_ci-jobgen
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

/// Shell types for completion generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionShell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Fish Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish Shell
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Execute the `completions` command.
///
/// Writes the completion script for the requested shell to stdout. The
/// command name in the script is always `ci-jobgen`, whatever the binary
/// was invoked as.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(
        Shell::from(args.shell),
        &mut cmd,
        "ci-jobgen",
        &mut io::stdout(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shell_maps_to_clap_complete() {
        assert_eq!(Shell::from(CompletionShell::Bash), Shell::Bash);
        assert_eq!(Shell::from(CompletionShell::PowerShell), Shell::PowerShell);
        assert_eq!(Shell::from(CompletionShell::Elvish), Shell::Elvish);
    }

    #[test]
    fn test_powershell_value_name() {
        let shell = CompletionShell::from_str("powershell", false).unwrap();
        assert_eq!(shell, CompletionShell::PowerShell);
    }
}
