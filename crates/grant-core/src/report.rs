//! Printable HTML report of the whole tracker.
//!
//! The output is a single self-contained page (inline CSS, inline SVG) meant
//! for the browser's print-to-PDF.

use chrono::{DateTime, Local, NaiveDate};
use std::fmt::Write as _;

use crate::chat::format::escape_html;
use crate::model::Document;
use crate::store::LOCAL_STAMP_FORMAT;
use crate::view::{Overview, TaskQuery, budget_rows, fmt_money, task_rows};

const STYLE: &str = "\
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,sans-serif;margin:2rem;color:#111}\
h1{margin:0 0 .25rem}h2{margin-top:2rem;border-bottom:1px solid #ccc;padding-bottom:.25rem}\
.muted{color:#666}.header{display:flex;align-items:center;gap:2rem}\
table{border-collapse:collapse;width:100%;font-size:.9rem}\
th,td{border:1px solid #ddd;padding:.35rem .5rem;text-align:left;vertical-align:top}\
th{background:#f4f4f4}td.num{text-align:right}.overdue{color:#b00020;font-weight:600}\
.totals td{font-weight:600}.notes{white-space:pre-wrap;border:1px solid #ddd;padding:.75rem}\
.ring-bg{stroke:#e6e6e6}.ring{stroke:#2e7d32;transform:rotate(-90deg);transform-origin:60px 60px}\
@media print{body{margin:0}}";

/// Render the report for `doc` as of `today`.
#[must_use]
pub fn render_html(doc: &Document, today: NaiveDate, generated_at: DateTime<Local>) -> String {
    let overview = Overview::of(doc, today);
    let title = if doc.meta.name.is_empty() {
        "Grant Tracker".to_string()
    } else {
        doc.meta.name.clone()
    };

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        escape_html(&title)
    );

    write_header(&mut html, &title, doc, &overview, generated_at);
    write_tasks(&mut html, doc, today);
    write_budget(&mut html, doc, &overview);

    html.push_str("<h2>Notes</h2>\n");
    if doc.notes.is_empty() {
        html.push_str("<p class=\"muted\">No notes.</p>\n");
    } else {
        let _ = writeln!(html, "<div class=\"notes\">{}</div>", escape_html(&doc.notes));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn write_header(
    html: &mut String,
    title: &str,
    doc: &Document,
    overview: &Overview,
    generated_at: DateTime<Local>,
) {
    let ring = overview.progress.ring();
    let _ = write!(
        html,
        "<div class=\"header\">\n\
         <svg width=\"120\" height=\"120\" viewBox=\"0 0 120 120\" role=\"img\" aria-label=\"{pct}% complete\">\
         <circle class=\"ring-bg\" cx=\"60\" cy=\"60\" r=\"{r}\" fill=\"none\" stroke-width=\"12\"/>\
         <circle class=\"ring\" cx=\"60\" cy=\"60\" r=\"{r}\" fill=\"none\" stroke-width=\"12\" stroke-dasharray=\"{dash}\"/>\
         <text x=\"60\" y=\"66\" text-anchor=\"middle\" font-size=\"20\">{pct}%</text></svg>\n<div>\n<h1>{}</h1>\n",
        escape_html(title),
        pct = overview.progress.pct,
        r = ring.radius,
        dash = ring.dasharray(),
    );

    if let Some(deadline) = doc.meta.deadline {
        let _ = write!(html, "<div>Deadline: {}", deadline.format("%Y-%m-%d"));
        if let Some(message) = &overview.deadline_message {
            let _ = write!(html, " &middot; <strong>{}</strong>", escape_html(message));
        }
        html.push_str("</div>\n");
    }
    let _ = write!(
        html,
        "<div>{} of {} tasks done</div>\n<div class=\"muted\">Generated {}</div>\n</div>\n</div>\n",
        overview.progress.done,
        overview.progress.total,
        generated_at.format(LOCAL_STAMP_FORMAT)
    );
}

fn write_tasks(html: &mut String, doc: &Document, today: NaiveDate) {
    html.push_str("<h2>Tasks</h2>\n");
    let rows = task_rows(&doc.tasks, &TaskQuery::default(), today);
    if rows.is_empty() {
        html.push_str("<p class=\"muted\">No tasks.</p>\n");
        return;
    }

    html.push_str(
        "<table>\n<thead><tr><th>Title</th><th>Owner</th><th>Due</th><th>Status</th>\
         <th>Category</th><th>Priority</th></tr></thead>\n<tbody>\n",
    );
    for row in rows {
        let due = row.due.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let due_cell = if row.overdue {
            format!("<span class=\"overdue\">{due} (overdue)</span>")
        } else {
            due
        };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{due_cell}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.title),
            escape_html(&row.owner),
            row.status,
            row.category,
            row.priority,
        );
    }
    html.push_str("</tbody>\n</table>\n");
}

fn write_budget(html: &mut String, doc: &Document, overview: &Overview) {
    html.push_str("<h2>Budget</h2>\n");
    let rows = budget_rows(&doc.budget);
    if rows.is_empty() {
        html.push_str("<p class=\"muted\">No budget lines.</p>\n");
        return;
    }

    html.push_str(
        "<table>\n<thead><tr><th>Item</th><th>Amount</th><th>Status</th><th>Notes</th></tr></thead>\n<tbody>\n",
    );
    for row in rows {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.item),
            row.amount_display,
            row.status.label(),
            escape_html(&row.notes),
        );
    }
    let totals = overview.totals;
    let _ = write!(
        html,
        "</tbody>\n<tfoot class=\"totals\">\
         <tr><td>Total</td><td class=\"num\">{}</td><td colspan=\"2\"></td></tr>\
         <tr><td>Secured</td><td class=\"num\">{}</td><td colspan=\"2\"></td></tr>\
         <tr><td>Gap</td><td class=\"num\">{}</td><td colspan=\"2\"></td></tr>\
         </tfoot>\n</table>\n",
        fmt_money(totals.total),
        fmt_money(totals.secured),
        fmt_money(totals.gap),
    );
}
