//
//  bugz-cli
//  cli/completion.rs
//

//! Shell completion scripts.

use clap::{Args, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use super::Cli;
use crate::error::Result;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub shell: CompletionShell,
}

#[derive(Subcommand, Debug)]
pub enum CompletionShell {
    /// Generate Bash completions
    Bash,

    /// Generate Zsh completions
    Zsh,

    /// Generate Fish completions
    Fish,

    /// Generate PowerShell completions
    Powershell,
}

impl CompletionArgs {
    /// Runs without configuration: completion generation must work on a
    /// machine that has no ~/.bugzrc yet.
    pub fn run(&self) -> Result<()> {
        let mut cmd = Cli::command();
        let name = "bugz";

        let shell = match self.shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
        };
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        Ok(())
    }
}
