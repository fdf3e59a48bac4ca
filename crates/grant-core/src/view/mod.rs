//! View derivation: everything the tracker displays is recomputed from the
//! [`Document`] after each change. Nothing here mutates state.

pub mod budget;
pub mod deadline;
pub mod progress;
pub mod tasks;

pub use budget::{BudgetRow, BudgetTotals, budget_rows, fmt_money};
pub use deadline::{days_until, deadline_message};
pub use progress::{Progress, RING_RADIUS, RingGauge};
pub use tasks::{Filter, TaskQuery, TaskRow, compare_tasks, task_rows};

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Document, date_or_empty};

/// Header summary: meta, countdown, progress, and budget totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub name: String,
    #[serde(with = "date_or_empty")]
    pub deadline: Option<NaiveDate>,
    pub deadline_message: Option<String>,
    pub progress: Progress,
    pub overdue: usize,
    pub budget_lines: usize,
    pub totals: BudgetTotals,
}

impl Overview {
    #[must_use]
    pub fn of(doc: &Document, today: NaiveDate) -> Self {
        Self {
            name: doc.meta.name.clone(),
            deadline: doc.meta.deadline,
            deadline_message: deadline_message(doc.meta.deadline, today),
            progress: Progress::of(&doc.tasks),
            overdue: doc.tasks.iter().filter(|t| t.is_overdue(today)).count(),
            budget_lines: doc.budget.len(),
            totals: BudgetTotals::of(&doc.budget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BudgetDraft, FundingStatus, RowId, TaskDraft, TaskStatus};

    #[test]
    fn overview_of_populated_document() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut doc = Document::default();
        doc.meta.name = "Producers Lab".into();
        doc.meta.deadline = NaiveDate::from_ymd_opt(2026, 10, 17);
        doc.tasks.push(
            TaskDraft {
                status: TaskStatus::Done,
                ..TaskDraft::new("a")
            }
            .into_task(RowId::new_unchecked("t-0001"))
            .unwrap(),
        );
        doc.tasks.push(
            TaskDraft {
                due: NaiveDate::from_ymd_opt(2026, 10, 1),
                ..TaskDraft::new("b")
            }
            .into_task(RowId::new_unchecked("t-0002"))
            .unwrap(),
        );
        doc.budget.push(
            BudgetDraft::new("Kits", 10.0)
                .with_status(FundingStatus::Secured)
                .into_line(RowId::new_unchecked("b-0001"))
                .unwrap(),
        );

        let overview = Overview::of(&doc, today);
        assert_eq!(overview.deadline_message.as_deref(), Some("Due tomorrow"));
        assert_eq!(overview.progress.pct, 50);
        assert_eq!(overview.overdue, 1);
        assert!(overview.totals.gap.abs() < f64::EPSILON);

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["deadline"], "2026-10-17");
        assert_eq!(json["progress"]["pct"], 50);
    }
}
