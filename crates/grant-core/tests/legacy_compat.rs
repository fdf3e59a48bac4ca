//! Files exported before rows carried IDs must keep importing.
//!
//! `tests/fixtures/legacy_export.json` is a frozen export in the pre-ID
//! shape (no `id` fields, integer amounts, en-dash titles). Never edit it.

use std::path::PathBuf;

use chrono::NaiveDate;
use grant_core::model::{Category, FundingStatus, Priority, TaskStatus};
use grant_core::store::{FileSlot, LoadOutcome, MemorySlot, Store};
use grant_core::transfer::{export_json, parse_import};
use grant_core::view::{Overview, TaskQuery, fmt_money, task_rows};

fn fixture() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("legacy_export.json");
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn legacy_export_parses() {
    let doc = parse_import(&fixture()).unwrap();
    assert_eq!(doc.meta.name, "Baltimore AI Producers Lab");
    assert_eq!(doc.meta.deadline, NaiveDate::from_ymd_opt(2026, 11, 1));
    assert_eq!(doc.tasks.len(), 4);
    assert_eq!(doc.tasks[1].status, TaskStatus::InProgress);
    assert_eq!(doc.tasks[2].category, Category::Letters);
    assert_eq!(doc.budget[0].status, FundingStatus::Secured);
    assert!(doc.tasks.iter().all(|t| t.id.is_empty()));
}

#[test]
fn import_assigns_unique_ids() {
    let mut store = Store::open(MemorySlot::default());
    store.replace(parse_import(&fixture()).unwrap()).unwrap();

    let doc = store.document();
    let mut ids: Vec<&str> = doc
        .tasks
        .iter()
        .map(|t| t.id.as_str())
        .chain(doc.budget.iter().map(|b| b.id.as_str()))
        .collect();
    assert!(ids.iter().take(4).all(|id| id.starts_with("t-")));
    assert!(ids.iter().skip(4).all(|id| id.starts_with("b-")));
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 7);
}

#[test]
fn legacy_views_render_expected_values() {
    let doc = parse_import(&fixture()).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();

    let rows = task_rows(&doc.tasks, &TaskQuery::default(), today);
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Budget draft v1",
            "Outline narrative",
            "Eligibility check – GitLab Foundation FAQ",
            "Letters of support – reach out",
        ]
    );
    assert!(rows[0].overdue);
    assert_eq!(rows[0].priority, Priority::P1);

    let overview = Overview::of(&doc, today);
    assert_eq!(overview.progress.pct, 25);
    assert_eq!(overview.deadline_message.as_deref(), Some("7 days remaining"));
    assert_eq!(fmt_money(overview.totals.total), "$80,000.50");
    assert_eq!(fmt_money(overview.totals.secured), "$10,000");
    assert_eq!(fmt_money(overview.totals.gap), "$70,000.50");
}

#[test]
fn legacy_file_in_slot_gets_stable_ids_until_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grant-tracker.v1.json");
    std::fs::write(&path, fixture()).unwrap();

    let first = Store::open(FileSlot::new(&path));
    let second = Store::open(FileSlot::new(&path));
    assert_eq!(first.load_outcome(), LoadOutcome::Restored);
    assert_eq!(first.document(), second.document());

    let mut store = second;
    store.set_notes("saved once").unwrap();
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["tasks"][0]["id"], first.document().tasks[0].id.as_str());
}

#[test]
fn export_of_imported_legacy_file_reimports_identically() {
    let mut store = Store::open(MemorySlot::default());
    store.replace(parse_import(&fixture()).unwrap()).unwrap();
    let exported = export_json(store.document()).unwrap();
    assert_eq!(&parse_import(&exported).unwrap(), store.document());
}
