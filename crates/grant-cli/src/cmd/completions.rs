//! `grant completions`: shell completion scripts.

use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

/// Binary name the generated scripts complete for.
const BIN_NAME: &str = "grant";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    generate(shell, command, BIN_NAME, out);
}

pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(args.shell, command, &mut out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn bash_script_completes_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut crate::Cli::command(), &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("_grant()"));
        assert!(script.contains("samples"));
    }
}
