//! `grant budget`: budget lines and funding totals.

use crate::cmd::{confirm, parse_flag};
use crate::context::AppContext;
use crate::output::{OutputMode, Renderable, pretty_kv, render, render_list};
use clap::{Args, Subcommand};
use grant_core::error::GrantError;
use grant_core::model::{BudgetDraft, BudgetPatch, FundingStatus, RowId};
use grant_core::view::{BudgetRow, BudgetTotals, budget_rows, fmt_money};
use serde::Serialize;
use std::io::Write;

#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    /// Add a budget line.
    Add(BudgetAddArgs),
    /// List budget lines with total, secured, and gap.
    List,
    /// Flip a line between pending and secured.
    Toggle(BudgetIdArgs),
    /// Change one or more fields of a budget line.
    Edit(BudgetEditArgs),
    /// Delete a budget line.
    Delete(BudgetDeleteArgs),
}

#[derive(Args, Debug)]
pub struct BudgetAddArgs {
    /// What the money is for.
    pub item: String,

    /// Amount in US dollars.
    #[arg(allow_negative_numbers = true)]
    pub amount: f64,

    /// `pending` (default) or `secured`.
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug)]
pub struct BudgetIdArgs {
    /// Budget line ID or unique prefix.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct BudgetEditArgs {
    /// Budget line ID or unique prefix.
    pub id: String,

    #[arg(long)]
    pub item: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub amount: Option<f64>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct BudgetDeleteArgs {
    /// Budget line ID or unique prefix.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl Renderable for BudgetRow {
    fn table_headers() -> &'static [&'static str] {
        &["ID", "ITEM", "AMOUNT", "STATUS", "NOTES"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.item.clone(),
            self.amount_display.clone(),
            self.status.label().to_string(),
            self.notes.clone(),
        ]
    }
}

#[derive(Debug, Serialize)]
struct BudgetListing {
    lines: Vec<BudgetRow>,
    totals: BudgetTotals,
}

#[derive(Debug, Serialize)]
struct Toggled {
    id: RowId,
    item: String,
    status: FundingStatus,
    totals: BudgetTotals,
}

pub fn run_budget(command: &BudgetCommand, ctx: &AppContext) -> anyhow::Result<()> {
    match command {
        BudgetCommand::Add(args) => run_add(args, ctx),
        BudgetCommand::List => run_list(ctx),
        BudgetCommand::Toggle(args) => run_toggle(args, ctx),
        BudgetCommand::Edit(args) => run_edit(args, ctx),
        BudgetCommand::Delete(args) => run_delete(args, ctx),
    }
}

fn draft_from(args: &BudgetAddArgs) -> Result<BudgetDraft, GrantError> {
    let status = parse_flag(args.status.as_deref())?.unwrap_or_default();
    Ok(BudgetDraft {
        notes: args.notes.clone(),
        ..BudgetDraft::new(&args.item, args.amount).with_status(status)
    })
}

fn patch_from(args: &BudgetEditArgs) -> Result<BudgetPatch, GrantError> {
    let patch = BudgetPatch {
        item: args.item.clone(),
        amount: args.amount,
        status: parse_flag(args.status.as_deref())?,
        notes: args.notes.clone(),
    };
    if patch.is_empty() {
        return Err(GrantError::invalid(
            "edit",
            "nothing to change; see `grant budget edit --help`",
        ));
    }
    Ok(patch)
}

fn write_totals(out: &mut dyn Write, totals: BudgetTotals) -> std::io::Result<()> {
    writeln!(out)?;
    pretty_kv(out, "Total", fmt_money(totals.total))?;
    pretty_kv(out, "Secured", fmt_money(totals.secured))?;
    pretty_kv(out, "Gap", fmt_money(totals.gap))
}

fn run_add(args: &BudgetAddArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let draft = draft_from(args)?;
    let line = ctx.with_store(|store| {
        let id = store.add_budget_line(draft)?;
        store
            .budget_line(&id)
            .cloned()
            .ok_or(GrantError::BudgetLineNotFound { id: id.to_string() })
    })?;
    ctx.report(
        &line,
        &format!("Added budget line {}: {} ({})", line.id, line.item, fmt_money(line.amount)),
    )
}

fn run_list(ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store();
    let budget = &store.document().budget;
    let listing = BudgetListing {
        lines: budget_rows(budget),
        totals: BudgetTotals::of(budget),
    };

    match ctx.output {
        OutputMode::Json => render(ctx.output, &listing, |_, _| Ok(())),
        OutputMode::Text => Ok(render_list(&listing.lines, ctx.output, "")?),
        OutputMode::Pretty => {
            render_list(&listing.lines, ctx.output, "No budget lines yet. Add one with `grant budget add`.")?;
            render(ctx.output, &listing, |l, w| write_totals(w, l.totals))
        }
    }
}

fn run_toggle(args: &BudgetIdArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let toggled = ctx.with_store(|store| {
        let id = store.document().resolve_budget_id(&args.id)?;
        let status = store.toggle_budget_line(&id)?;
        let item = store.budget_line(&id).map(|l| l.item.clone()).unwrap_or_default();
        Ok(Toggled {
            id,
            item,
            status,
            totals: BudgetTotals::of(&store.document().budget),
        })
    })?;
    ctx.report(
        &toggled,
        &format!(
            "{} '{}' is now {} (secured {}, gap {})",
            toggled.id,
            toggled.item,
            toggled.status,
            fmt_money(toggled.totals.secured),
            fmt_money(toggled.totals.gap)
        ),
    )
}

fn run_edit(args: &BudgetEditArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let patch = patch_from(args)?;
    let line = ctx.with_store(|store| {
        let id = store.document().resolve_budget_id(&args.id)?;
        store.edit_budget_line(&id, &patch)
    })?;
    ctx.report(
        &line,
        &format!("Updated budget line {}: {} ({})", line.id, line.item, fmt_money(line.amount)),
    )
}

fn run_delete(args: &BudgetDeleteArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let (id, item) = {
        let store = ctx.open_store();
        let id = store.document().resolve_budget_id(&args.id)?;
        let item = store.budget_line(&id).map(|l| l.item.clone()).unwrap_or_default();
        (id, item)
    };

    if !args.yes && !confirm(&format!("Delete budget line {id} '{item}'?"))? {
        return ctx.report(&serde_json::json!({ "deleted": false, "id": id }), "Cancelled");
    }

    let line = ctx.with_store(|store| store.delete_budget_line(&id))?;
    ctx.report(&line, &format!("Deleted budget line {}: {}", line.id, line.item))
}
