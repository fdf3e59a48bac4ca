//! `grant clear`: delete all stored tracker data.

use crate::cmd::confirm;
use crate::context::AppContext;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct ClearArgs {
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct Cleared {
    cleared: bool,
    store: PathBuf,
}

pub fn run_clear(args: &ClearArgs, ctx: &AppContext) -> anyhow::Result<()> {
    if !args.yes && !confirm("Clear all grant data? This cannot be undone.")? {
        return ctx.report(
            &Cleared {
                cleared: false,
                store: ctx.store_path.clone(),
            },
            "Cancelled",
        );
    }

    ctx.with_store(|store| store.clear())?;
    ctx.report(
        &Cleared {
            cleared: true,
            store: ctx.store_path.clone(),
        },
        &format!("Cleared {}", ctx.store_path.display()),
    )
}
