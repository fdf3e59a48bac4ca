//! `grant export`: write the whole tracker as pretty JSON.

use crate::context::AppContext;
use anyhow::Context as _;
use clap::Args;
use grant_core::transfer::{export_file_name, export_json};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Destination file. Defaults to `<grant-name-slug>.json` in the
    /// current directory.
    #[arg(long, short = 'o', conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Write the export to stdout instead of a file.
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Serialize)]
struct Exported {
    path: PathBuf,
    tasks: usize,
    budget_lines: usize,
}

pub fn run_export(args: &ExportArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store();
    let doc = store.document();
    let json = export_json(doc)?;

    if args.stdout {
        let mut out = std::io::stdout().lock();
        out.write_all(json.as_bytes())?;
        return Ok(());
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_file_name(&doc.meta.name)));
    std::fs::write(&path, &json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "tracker exported");

    let exported = Exported {
        path,
        tasks: doc.tasks.len(),
        budget_lines: doc.budget.len(),
    };
    ctx.report(
        &exported,
        &format!(
            "Exported {} tasks and {} budget lines to {}",
            exported.tasks,
            exported.budget_lines,
            exported.path.display()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ExportArgs,
    }

    #[test]
    fn output_and_stdout_conflict() {
        assert!(Wrapper::try_parse_from(["test", "--stdout", "-o", "x.json"]).is_err());
        let w = Wrapper::parse_from(["test"]);
        assert!(w.args.output.is_none());
        assert!(!w.args.stdout);
    }
}
