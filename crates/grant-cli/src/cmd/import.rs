//! `grant import`: replace the tracker with an exported file.

use crate::context::AppContext;
use anyhow::Context as _;
use clap::Args;
use grant_core::transfer::parse_import;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file produced by `grant export` (older exports without row IDs
    /// are accepted).
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
struct Imported {
    name: String,
    tasks: usize,
    budget_lines: usize,
    notes: bool,
}

pub fn run_import(args: &ImportArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    // Parse before taking the lock: a bad file never touches the store.
    let incoming = parse_import(&raw)?;

    let imported = ctx.with_store(|store| {
        store.replace(incoming)?;
        let doc = store.document();
        Ok(Imported {
            name: doc.meta.name.clone(),
            tasks: doc.tasks.len(),
            budget_lines: doc.budget.len(),
            notes: !doc.notes.is_empty(),
        })
    })?;
    tracing::info!(path = %args.path.display(), tasks = imported.tasks, "tracker imported");

    ctx.report(
        &imported,
        &format!(
            "Imported {} tasks and {} budget lines from {}",
            imported.tasks,
            imported.budget_lines,
            args.path.display()
        ),
    )
}
