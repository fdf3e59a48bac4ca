//! `grant print`: self-contained HTML report for print-to-PDF.

use crate::context::{AppContext, today};
use anyhow::Context as _;
use chrono::Local;
use clap::Args;
use grant_core::report::render_html;
use grant_core::transfer::file_slug;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct PrintArgs {
    /// Destination file. Defaults to `<grant-name-slug>.html` in the
    /// current directory.
    #[arg(long, short = 'o', conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Write the HTML to stdout instead of a file.
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Serialize)]
struct Printed {
    path: PathBuf,
    bytes: usize,
}

pub fn report_file_name(grant_name: &str) -> String {
    format!("{}.html", file_slug(grant_name))
}

pub fn run_print(args: &PrintArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store();
    let doc = store.document();
    let html = render_html(doc, today(), Local::now());

    if args.stdout {
        std::io::stdout().lock().write_all(html.as_bytes())?;
        return Ok(());
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report_file_name(&doc.meta.name)));
    std::fs::write(&path, &html).with_context(|| format!("Failed to write {}", path.display()))?;

    let printed = Printed {
        path,
        bytes: html.len(),
    };
    ctx.report(
        &printed,
        &format!(
            "Wrote report to {}; open it in a browser and print to PDF",
            printed.path.display()
        ),
    )
}
