//! Property tests for the store: every mutation persists a full snapshot, and
//! export/import and reopen reproduce the same document.

use chrono::NaiveDate;
use grant_core::model::{
    BudgetDraft, BudgetPatch, Category, FundingStatus, Priority, TaskDraft, TaskPatch, TaskStatus,
};
use grant_core::store::{FileSlot, MemorySlot, Slot, Store};
use grant_core::transfer::{export_json, parse_import};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddTask(TaskDraft),
    AddLine(BudgetDraft),
    Advance(usize),
    EditTask(usize, TaskPatch),
    DeleteTask(usize),
    Toggle(usize),
    EditLine(usize, BudgetPatch),
    DeleteLine(usize),
    Notes(String),
    Name(String),
    Deadline(Option<NaiveDate>),
}

fn arb_date() -> impl Strategy<Value = Option<NaiveDate>> {
    prop_oneof![
        Just(None),
        (2020i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
    ]
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::RING.to_vec())
}

fn arb_category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(vec![Priority::P1, Priority::P2, Priority::P3])
}

fn arb_text() -> impl Strategy<Value = String> {
    "[ a-zA-Z0-9–&<>\"]{0,16}"
}

fn arb_task_draft() -> impl Strategy<Value = TaskDraft> {
    (arb_text(), arb_text(), arb_date(), arb_status(), arb_category(), arb_priority()).prop_map(
        |(title, owner, due, status, category, priority)| TaskDraft {
            title,
            owner,
            due,
            status,
            category,
            priority,
        },
    )
}

fn arb_amount() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => (0u32..5_000_000).prop_map(|cents| f64::from(cents) / 100.0),
        1 => Just(-1.0),
        1 => Just(f64::NAN),
    ]
}

fn arb_budget_draft() -> impl Strategy<Value = BudgetDraft> {
    (arb_text(), arb_amount(), any::<bool>(), arb_text()).prop_map(
        |(item, amount, secured, notes)| BudgetDraft {
            item,
            amount,
            status: if secured {
                FundingStatus::Secured
            } else {
                FundingStatus::Pending
            },
            notes,
        },
    )
}

fn arb_task_patch() -> impl Strategy<Value = TaskPatch> {
    (
        prop::option::of(arb_text()),
        prop::option::of(arb_text()),
        prop::option::of(arb_date()),
        prop::option::of(arb_status()),
        prop::option::of(arb_priority()),
    )
        .prop_map(|(title, owner, due, status, priority)| TaskPatch {
            title,
            owner,
            due,
            status,
            category: None,
            priority,
        })
}

fn arb_budget_patch() -> impl Strategy<Value = BudgetPatch> {
    (prop::option::of(arb_text()), prop::option::of(arb_amount())).prop_map(|(item, amount)| {
        BudgetPatch {
            item,
            amount,
            ..BudgetPatch::default()
        }
    })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_task_draft().prop_map(Op::AddTask),
        3 => arb_budget_draft().prop_map(Op::AddLine),
        2 => any::<usize>().prop_map(Op::Advance),
        2 => (any::<usize>(), arb_task_patch()).prop_map(|(i, p)| Op::EditTask(i, p)),
        1 => any::<usize>().prop_map(Op::DeleteTask),
        2 => any::<usize>().prop_map(Op::Toggle),
        2 => (any::<usize>(), arb_budget_patch()).prop_map(|(i, p)| Op::EditLine(i, p)),
        1 => any::<usize>().prop_map(Op::DeleteLine),
        1 => arb_text().prop_map(Op::Notes),
        1 => arb_text().prop_map(Op::Name),
        1 => arb_date().prop_map(Op::Deadline),
    ]
}

/// Apply `op`, addressing rows by the ID at a (wrapped) position. Rejected
/// operations are expected and ignored.
fn apply<S: Slot>(store: &mut Store<S>, op: Op) {
    let task_id = |store: &Store<S>, i: usize| {
        let tasks = &store.document().tasks;
        (!tasks.is_empty()).then(|| tasks[i % tasks.len()].id.clone())
    };
    let line_id = |store: &Store<S>, i: usize| {
        let budget = &store.document().budget;
        (!budget.is_empty()).then(|| budget[i % budget.len()].id.clone())
    };

    let _ = match op {
        Op::AddTask(draft) => store.add_task(draft).map(drop),
        Op::AddLine(draft) => store.add_budget_line(draft).map(drop),
        Op::Advance(i) => match task_id(store, i) {
            Some(id) => store.advance_task(&id).map(drop),
            None => Ok(()),
        },
        Op::EditTask(i, patch) => match task_id(store, i) {
            Some(id) => store.edit_task(&id, &patch).map(drop),
            None => Ok(()),
        },
        Op::DeleteTask(i) => match task_id(store, i) {
            Some(id) => store.delete_task(&id).map(drop),
            None => Ok(()),
        },
        Op::Toggle(i) => match line_id(store, i) {
            Some(id) => store.toggle_budget_line(&id).map(drop),
            None => Ok(()),
        },
        Op::EditLine(i, patch) => match line_id(store, i) {
            Some(id) => store.edit_budget_line(&id, &patch).map(drop),
            None => Ok(()),
        },
        Op::DeleteLine(i) => match line_id(store, i) {
            Some(id) => store.delete_budget_line(&id).map(drop),
            None => Ok(()),
        },
        Op::Notes(text) => store.set_notes(&text),
        Op::Name(name) => store.set_name(&name),
        Op::Deadline(date) => store.set_deadline(date),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn snapshot_always_equals_document(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut store = Store::open(MemorySlot::default());
        for op in ops {
            apply(&mut store, op);
            if let Some(raw) = store.slot().value() {
                prop_assert_eq!(raw.to_string(), serde_json::to_string(store.document()).unwrap());
            }
        }
        prop_assert!(store.document().validate().is_ok());
    }

    #[test]
    fn export_then_import_is_identity(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut store = Store::open(MemorySlot::default());
        for op in ops {
            apply(&mut store, op);
        }
        let exported = export_json(store.document()).unwrap();
        let imported = parse_import(&exported).unwrap();
        prop_assert_eq!(&imported, store.document());
    }

    #[test]
    fn reopening_file_slot_restores_document(ops in prop::collection::vec(arb_op(), 1..20)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grant-tracker.v1.json");
        let mut store = Store::open(FileSlot::new(&path));
        for op in ops {
            apply(&mut store, op);
        }
        let reopened = Store::open(FileSlot::new(&path));
        prop_assert_eq!(reopened.document(), store.document());
    }

    #[test]
    fn row_ids_stay_unique(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut store = Store::open(MemorySlot::default());
        for op in ops {
            apply(&mut store, op);
        }
        let doc = store.document();
        let mut ids: Vec<&str> = doc.tasks.iter().map(|t| t.id.as_str())
            .chain(doc.budget.iter().map(|b| b.id.as_str()))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }
}
