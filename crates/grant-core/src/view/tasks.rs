//! Filtered, sorted task table.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::model::{Category, ParseEnumError, Priority, RowId, Task, TaskStatus, date_or_empty};

/// A dropdown-style filter: everything, or one exact value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr<Err = ParseEnumError>> FromStr for Filter<T> {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// The search box plus the status and category dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub text: String,
    pub status: Filter<TaskStatus>,
    pub category: Filter<Category>,
}

impl TaskQuery {
    /// True when the task passes the text search and both filters.
    ///
    /// The text search is a case-insensitive substring match over title,
    /// owner, category, and priority.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.text.trim().to_lowercase();
        let text_hit = needle.is_empty()
            || [
                task.title.as_str(),
                task.owner.as_str(),
                task.category.as_str(),
                task.priority.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));

        text_hit && self.status.matches(&task.status) && self.category.matches(&task.category)
    }
}

/// Table order: priority, then earliest due (undated last), then status
/// label, then title.
#[must_use]
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| compare_due(a.due, b.due))
        .then_with(|| a.status.as_str().cmp(b.status.as_str()))
        .then_with(|| compare_text(&a.title, &b.title))
}

fn compare_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive; titles differing only in case put lowercase first.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// One rendered task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub id: RowId,
    pub title: String,
    pub owner: String,
    #[serde(with = "date_or_empty")]
    pub due: Option<NaiveDate>,
    pub overdue: bool,
    pub status: TaskStatus,
    pub category: Category,
    pub priority: Priority,
}

impl TaskRow {
    fn from_task(task: &Task, today: NaiveDate) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            owner: task.owner.clone(),
            due: task.due,
            overdue: task.is_overdue(today),
            status: task.status,
            category: task.category,
            priority: task.priority,
        }
    }
}

/// Filter and sort `tasks` into table rows. Insertion order breaks any tie
/// the comparator leaves.
#[must_use]
pub fn task_rows(tasks: &[Task], query: &TaskQuery, today: NaiveDate) -> Vec<TaskRow> {
    let mut matching: Vec<&Task> = tasks.iter().filter(|task| query.matches(task)).collect();
    matching.sort_by(|a, b| compare_tasks(a, b));
    matching
        .into_iter()
        .map(|task| TaskRow::from_task(task, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskDraft;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, draft: TaskDraft) -> Task {
        draft.into_task(RowId::new_unchecked(id)).unwrap()
    }

    fn titles(rows: &[TaskRow]) -> Vec<&str> {
        rows.iter().map(|row| row.title.as_str()).collect()
    }

    #[test]
    fn priority_first_then_title() {
        let due = Some(date(2026, 6, 1));
        let tasks = vec![
            task("t-0001", TaskDraft { priority: Priority::P2, due, ..TaskDraft::new("delta") }),
            task("t-0002", TaskDraft { priority: Priority::P1, due, ..TaskDraft::new("bravo") }),
            task("t-0003", TaskDraft { priority: Priority::P3, due, ..TaskDraft::new("alpha") }),
            task("t-0004", TaskDraft { priority: Priority::P1, due, ..TaskDraft::new("alpha") }),
        ];
        let rows = task_rows(&tasks, &TaskQuery::default(), date(2026, 1, 1));
        assert_eq!(titles(&rows), vec!["alpha", "bravo", "delta", "alpha"]);
        assert_eq!(rows[0].priority, Priority::P1);
        assert_eq!(rows[3].priority, Priority::P3);
    }

    #[test]
    fn title_ties_ignore_case_then_put_lowercase_first() {
        let tasks = vec![
            task("t-0001", TaskDraft::new("Banana")),
            task("t-0002", TaskDraft::new("Apple")),
            task("t-0003", TaskDraft::new("apple")),
        ];
        let rows = task_rows(&tasks, &TaskQuery::default(), date(2026, 1, 1));
        assert_eq!(titles(&rows), vec!["apple", "Apple", "Banana"]);
    }

    #[test]
    fn undated_tasks_sort_after_dated() {
        let tasks = vec![
            task("t-0001", TaskDraft::new("undated")),
            task("t-0002", TaskDraft { due: Some(date(2026, 9, 1)), ..TaskDraft::new("late") }),
            task("t-0003", TaskDraft { due: Some(date(2026, 3, 1)), ..TaskDraft::new("early") }),
        ];
        let rows = task_rows(&tasks, &TaskQuery::default(), date(2026, 1, 1));
        assert_eq!(titles(&rows), vec!["early", "late", "undated"]);
    }

    #[test]
    fn status_label_breaks_due_ties() {
        let tasks = vec![
            task("t-0001", TaskDraft { status: TaskStatus::NotStarted, ..TaskDraft::new("x") }),
            task("t-0002", TaskDraft { status: TaskStatus::Blocked, ..TaskDraft::new("y") }),
            task("t-0003", TaskDraft { status: TaskStatus::Done, ..TaskDraft::new("z") }),
        ];
        let rows = task_rows(&tasks, &TaskQuery::default(), date(2026, 1, 1));
        assert_eq!(titles(&rows), vec!["y", "z", "x"]);
    }

    #[test]
    fn text_search_covers_owner_category_priority() {
        let tasks = vec![
            task("t-0001", TaskDraft { owner: "Dana".into(), ..TaskDraft::new("one") }),
            task("t-0002", TaskDraft { category: Category::Letters, ..TaskDraft::new("two") }),
            task("t-0003", TaskDraft { priority: Priority::P3, ..TaskDraft::new("three") }),
        ];
        let today = date(2026, 1, 1);
        let search = |text: &str| TaskQuery { text: text.into(), ..TaskQuery::default() };
        assert_eq!(titles(&task_rows(&tasks, &search("dana"), today)), vec!["one"]);
        assert_eq!(titles(&task_rows(&tasks, &search("LETTERS"), today)), vec!["two"]);
        assert_eq!(titles(&task_rows(&tasks, &search("p3"), today)), vec!["three"]);
        assert!(task_rows(&tasks, &search("nobody"), today).is_empty());
    }

    #[test]
    fn dropdown_filters_combine_with_search() {
        let tasks = vec![
            task("t-0001", TaskDraft { status: TaskStatus::Done, category: Category::Budget, ..TaskDraft::new("budget done") }),
            task("t-0002", TaskDraft { category: Category::Budget, ..TaskDraft::new("budget open") }),
            task("t-0003", TaskDraft { status: TaskStatus::Done, ..TaskDraft::new("other done") }),
        ];
        let query = TaskQuery {
            text: "budget".into(),
            status: Filter::Only(TaskStatus::Done),
            category: Filter::All,
        };
        let rows = task_rows(&tasks, &query, date(2026, 1, 1));
        assert_eq!(titles(&rows), vec!["budget done"]);
    }

    #[test]
    fn overdue_flag_on_rows() {
        let tasks = vec![
            task("t-0001", TaskDraft { due: Some(date(2026, 1, 1)), ..TaskDraft::new("late") }),
            task("t-0002", TaskDraft { due: Some(date(2026, 1, 1)), status: TaskStatus::Done, ..TaskDraft::new("late but done") }),
        ];
        let rows = task_rows(&tasks, &TaskQuery::default(), date(2026, 1, 5));
        assert!(rows.iter().find(|r| r.title == "late").unwrap().overdue);
        assert!(!rows.iter().find(|r| r.title == "late but done").unwrap().overdue);
    }

    #[test]
    fn filter_parses_all_or_value() {
        assert_eq!("all".parse::<Filter<TaskStatus>>().unwrap(), Filter::All);
        assert_eq!(
            "blocked".parse::<Filter<TaskStatus>>().unwrap(),
            Filter::Only(TaskStatus::Blocked)
        );
        assert!("nope".parse::<Filter<Category>>().is_err());
    }
}
