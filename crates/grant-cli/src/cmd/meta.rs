//! `grant meta set`: grant name and submission deadline.

use crate::context::AppContext;
use clap::{Args, Subcommand};
use grant_core::error::GrantError;
use grant_core::model::parse_date_input;

#[derive(Subcommand, Debug)]
pub enum MetaCommand {
    /// Update the grant name and/or deadline.
    Set(MetaSetArgs),
}

#[derive(Args, Debug)]
pub struct MetaSetArgs {
    /// Grant name (also names export and report files).
    #[arg(long)]
    pub name: Option<String>,

    /// Submission deadline (YYYY-MM-DD).
    #[arg(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,

    /// Remove the deadline.
    #[arg(long)]
    pub clear_deadline: bool,
}

pub fn run_meta(command: &MetaCommand, ctx: &AppContext) -> anyhow::Result<()> {
    match command {
        MetaCommand::Set(args) => run_set(args, ctx),
    }
}

fn run_set(args: &MetaSetArgs, ctx: &AppContext) -> anyhow::Result<()> {
    if args.name.is_none() && args.deadline.is_none() && !args.clear_deadline {
        return Err(GrantError::invalid(
            "meta",
            "nothing to update; pass --name, --deadline or --clear-deadline",
        )
        .into());
    }

    let deadline = match (&args.deadline, args.clear_deadline) {
        (_, true) => Some(None),
        (Some(raw), false) => Some(parse_date_input("deadline", raw)?),
        (None, false) => None,
    };

    let meta = ctx.with_store(|store| {
        if let Some(name) = &args.name {
            store.set_name(name)?;
        }
        if let Some(deadline) = deadline {
            store.set_deadline(deadline)?;
        }
        Ok(store.document().meta.clone())
    })?;

    let message = match (meta.name.as_str(), meta.deadline) {
        ("", None) => "Updated grant details".to_string(),
        (name, None) => format!("Updated '{name}' (no deadline)"),
        (name, Some(date)) => format!("Updated '{name}', deadline {}", date.format("%Y-%m-%d")),
    };
    ctx.report(&meta, &message)
}
