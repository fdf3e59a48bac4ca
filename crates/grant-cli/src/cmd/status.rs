//! `grant status`: grant name, countdown, progress, and budget at a glance.

use crate::context::{AppContext, stored_at, today};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};
use chrono::{DateTime, Local};
use clap::Args;
use grant_core::store::LOCAL_STAMP_FORMAT;
use grant_core::store::LoadOutcome;
use grant_core::view::{Overview, Progress, fmt_money};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

#[derive(Debug, Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    overview: Overview,
    store: PathBuf,
    stored: bool,
    last_saved: Option<DateTime<Local>>,
}

const BAR_WIDTH: usize = 20;

/// `[######--------------]` scaled to the completion percentage.
fn progress_bar(progress: Progress) -> String {
    let filled = usize::from(progress.pct) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn write_human(out: &mut dyn Write, status: &StatusOutput, mode: OutputMode) -> std::io::Result<()> {
    let o = &status.overview;
    let name = if o.name.is_empty() { "(unnamed grant)" } else { o.name.as_str() };
    let deadline = o.deadline.map_or_else(
        || "not set".to_string(),
        |date| match &o.deadline_message {
            Some(message) => format!("{} ({message})", date.format("%Y-%m-%d")),
            None => date.format("%Y-%m-%d").to_string(),
        },
    );
    let progress = format!(
        "{}/{} tasks done ({}%)",
        o.progress.done, o.progress.total, o.progress.pct
    );

    if mode.is_pretty() {
        pretty_section(out, name)?;
        pretty_kv(out, "Deadline", deadline)?;
        pretty_kv(out, "Progress", format!("{} {progress}", progress_bar(o.progress)))?;
        if o.overdue > 0 {
            pretty_kv(out, "Overdue", o.overdue.to_string())?;
        }
        if let Some(at) = status.last_saved {
            pretty_kv(out, "Saved", at.format(LOCAL_STAMP_FORMAT).to_string())?;
        }
        pretty_kv(
            out,
            "Budget",
            format!(
                "{} total, {} secured, {} gap ({} lines)",
                fmt_money(o.totals.total),
                fmt_money(o.totals.secured),
                fmt_money(o.totals.gap),
                o.budget_lines
            ),
        )?;
        if !status.stored {
            writeln!(out)?;
            writeln!(out, "Nothing saved yet. Try `grant task samples` or `grant meta set --name ...`.")?;
        }
    } else {
        writeln!(out, "name\t{}", o.name)?;
        writeln!(out, "deadline\t{}", o.deadline.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default())?;
        writeln!(out, "deadline_message\t{}", o.deadline_message.as_deref().unwrap_or(""))?;
        writeln!(out, "progress\t{progress}")?;
        writeln!(out, "overdue\t{}", o.overdue)?;
        writeln!(out, "budget_total\t{}", fmt_money(o.totals.total))?;
        writeln!(out, "budget_secured\t{}", fmt_money(o.totals.secured))?;
        writeln!(out, "budget_gap\t{}", fmt_money(o.totals.gap))?;
        writeln!(
            out,
            "last_saved\t{}",
            status.last_saved.map(|at| at.to_rfc3339()).unwrap_or_default()
        )?;
    }
    Ok(())
}

pub fn run_status(_args: &StatusArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store();
    let status = StatusOutput {
        overview: Overview::of(store.document(), today()),
        store: ctx.store_path.clone(),
        stored: store.load_outcome() == LoadOutcome::Restored,
        last_saved: stored_at(&ctx.store_path),
    };
    render(ctx.output, &status, |s, w| write_human(w, s, ctx.output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use grant_core::model::{Document, RowId, TaskDraft, TaskStatus};

    fn status_of(doc: &Document) -> StatusOutput {
        StatusOutput {
            overview: Overview::of(doc, chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            store: PathBuf::from("/tmp/tracker.json"),
            stored: true,
            last_saved: None,
        }
    }

    #[test]
    fn progress_bar_scales() {
        let bar = |pct| progress_bar(Progress { done: 0, total: 0, pct });
        assert_eq!(bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(bar(100), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn pretty_status_shows_countdown_and_progress() {
        let mut doc = Document::default();
        doc.meta.name = "Producers Lab".into();
        doc.meta.deadline = chrono::NaiveDate::from_ymd_opt(2026, 10, 17);
        doc.tasks.push(
            TaskDraft { status: TaskStatus::Done, ..TaskDraft::new("Outline") }
                .into_task(RowId::new_unchecked("t-0001"))
                .unwrap(),
        );

        let mut buf = Vec::new();
        write_human(&mut buf, &status_of(&doc), OutputMode::Pretty).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Producers Lab\n"));
        assert!(text.contains("2026-10-17 (Due tomorrow)"));
        assert!(text.contains("1/1 tasks done (100%)"));
        assert!(!text.contains("Saved"));

        let saved = StatusOutput {
            last_saved: Local.with_ymd_and_hms(2026, 10, 16, 15, 4, 5).single(),
            ..status_of(&doc)
        };
        let mut buf = Vec::new();
        write_human(&mut buf, &saved, OutputMode::Pretty).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("10/16/2026, 3:04:05 PM"));
    }

    #[test]
    fn json_status_flattens_overview() {
        let value = serde_json::to_value(status_of(&Document::default())).unwrap();
        assert_eq!(value["progress"]["pct"], 0);
        assert_eq!(value["deadline"], "");
        assert_eq!(value["store"], "/tmp/tracker.json");
        assert!(value["last_saved"].is_null());
    }
}
