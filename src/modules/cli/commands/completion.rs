//! Shell completions for `restbridge`

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::Write;

/// Print a completion script covering every CRUD subcommand and the global
/// `-f`/`--connection` flags. Hidden from `--help`; packaging scripts call it.
#[derive(Args, Debug)]
pub struct CompletionCommand {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionCommand {
    pub fn execute(&self) {
        self.write_to(&mut std::io::stdout());
    }

    /// Write the script for `self.shell` to any sink
    pub fn write_to(&self, out: &mut dyn Write) {
        let mut cmd = crate::Cli::command();
        let bin = cmd.get_name().to_string();
        generate(self.shell, &mut cmd, bin, out);
    }
}
