//! `grant task`: add, list, advance, edit, delete, and seed tasks.

use crate::cmd::{confirm, parse_flag};
use crate::context::{AppContext, today};
use crate::output::{Renderable, render_list};
use clap::{Args, Subcommand};
use grant_core::error::GrantError;
use grant_core::model::{RowId, Task, TaskDraft, TaskPatch, TaskStatus, parse_date_input};
use grant_core::view::{TaskQuery, TaskRow, task_rows};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task.
    Add(TaskAddArgs),
    /// List tasks in priority order, optionally filtered.
    List(TaskListArgs),
    /// Move a task to its next status.
    Advance(TaskIdArgs),
    /// Change one or more fields of a task.
    Edit(TaskEditArgs),
    /// Delete a task.
    Delete(TaskDeleteArgs),
    /// Append the starter task set.
    Samples,
}

#[derive(Args, Debug)]
pub struct TaskAddArgs {
    /// Task title.
    pub title: String,

    /// Who owns the task.
    #[arg(long, default_value = "")]
    pub owner: String,

    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    pub due: Option<String>,

    /// Not started, In progress, Blocked, or Done.
    #[arg(long)]
    pub status: Option<String>,

    /// Narrative, Budget, Letters, Compliance, or Other.
    #[arg(long)]
    pub category: Option<String>,

    /// P1, P2, or P3.
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct TaskListArgs {
    /// Case-insensitive search over title, owner, category, and priority.
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Status filter, or `all`.
    #[arg(long)]
    pub status: Option<String>,

    /// Category filter, or `all`.
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskIdArgs {
    /// Task ID or unique prefix.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct TaskEditArgs {
    /// Task ID or unique prefix.
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,

    /// New due date (YYYY-MM-DD); an empty value clears it.
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date.
    #[arg(long)]
    pub clear_due: bool,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskDeleteArgs {
    /// Task ID or unique prefix.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl Renderable for TaskRow {
    fn table_headers() -> &'static [&'static str] {
        &["ID", "TITLE", "OWNER", "DUE", "STATUS", "CATEGORY", "PRIORITY"]
    }

    fn cells(&self) -> Vec<String> {
        let due = self
            .due
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.owner.clone(),
            if self.overdue { format!("{due} (overdue)") } else { due },
            self.status.to_string(),
            self.category.to_string(),
            self.priority.to_string(),
        ]
    }
}

#[derive(Debug, Serialize)]
struct StatusChange {
    id: RowId,
    title: String,
    status: TaskStatus,
}

#[derive(Debug, Serialize)]
struct Added {
    ids: Vec<RowId>,
}

pub fn run_task(command: &TaskCommand, ctx: &AppContext) -> anyhow::Result<()> {
    match command {
        TaskCommand::Add(args) => run_add(args, ctx),
        TaskCommand::List(args) => run_list(args, ctx),
        TaskCommand::Advance(args) => run_advance(args, ctx),
        TaskCommand::Edit(args) => run_edit(args, ctx),
        TaskCommand::Delete(args) => run_delete(args, ctx),
        TaskCommand::Samples => run_samples(ctx),
    }
}

fn draft_from(args: &TaskAddArgs) -> Result<TaskDraft, GrantError> {
    let mut draft = TaskDraft::new(&args.title);
    draft.owner.clone_from(&args.owner);
    if let Some(raw) = &args.due {
        draft.due = parse_date_input("due", raw)?;
    }
    if let Some(status) = parse_flag(args.status.as_deref())? {
        draft.status = status;
    }
    if let Some(category) = parse_flag(args.category.as_deref())? {
        draft.category = category;
    }
    if let Some(priority) = parse_flag(args.priority.as_deref())? {
        draft.priority = priority;
    }
    Ok(draft)
}

fn query_from(args: &TaskListArgs) -> Result<TaskQuery, GrantError> {
    Ok(TaskQuery {
        text: args.search.clone(),
        status: parse_flag(args.status.as_deref())?.unwrap_or_default(),
        category: parse_flag(args.category.as_deref())?.unwrap_or_default(),
    })
}

fn patch_from(args: &TaskEditArgs) -> Result<TaskPatch, GrantError> {
    let due = if args.clear_due {
        Some(None)
    } else {
        args.due
            .as_deref()
            .map(|raw| parse_date_input("due", raw))
            .transpose()?
    };
    let patch = TaskPatch {
        title: args.title.clone(),
        owner: args.owner.clone(),
        due,
        status: parse_flag(args.status.as_deref())?,
        category: parse_flag(args.category.as_deref())?,
        priority: parse_flag(args.priority.as_deref())?,
    };
    if patch.is_empty() {
        return Err(GrantError::invalid(
            "edit",
            "nothing to change; see `grant task edit --help`",
        ));
    }
    Ok(patch)
}

fn run_add(args: &TaskAddArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let draft = draft_from(args)?;
    let task = ctx.with_store(|store| {
        let id = store.add_task(draft)?;
        store
            .task(&id)
            .cloned()
            .ok_or(GrantError::TaskNotFound { id: id.to_string() })
    })?;
    ctx.report(&task, &format!("Added task {}: {}", task.id, task.title))
}

fn run_list(args: &TaskListArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let query = query_from(args)?;
    let store = ctx.open_store();
    let rows = task_rows(&store.document().tasks, &query, today());
    let empty = if store.document().tasks.is_empty() {
        "No tasks yet. Add one with `grant task add` or `grant task samples`."
    } else {
        "No tasks match the current filters."
    };
    render_list(&rows, ctx.output, empty)?;
    Ok(())
}

fn run_advance(args: &TaskIdArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let change = ctx.with_store(|store| {
        let id = store.document().resolve_task_id(&args.id)?;
        let status = store.advance_task(&id)?;
        let title = store.task(&id).map(|t| t.title.clone()).unwrap_or_default();
        Ok(StatusChange { id, title, status })
    })?;
    ctx.report(&change, &format!("{} '{}' is now {}", change.id, change.title, change.status))
}

fn run_edit(args: &TaskEditArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let patch = patch_from(args)?;
    let task: Task = ctx.with_store(|store| {
        let id = store.document().resolve_task_id(&args.id)?;
        store.edit_task(&id, &patch)
    })?;
    ctx.report(&task, &format!("Updated task {}: {}", task.id, task.title))
}

fn run_delete(args: &TaskDeleteArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let (id, title) = {
        let store = ctx.open_store();
        let id = store.document().resolve_task_id(&args.id)?;
        let title = store.task(&id).map(|t| t.title.clone()).unwrap_or_default();
        (id, title)
    };

    if !args.yes && !confirm(&format!("Delete task {id} '{title}'?"))? {
        return ctx.report(&serde_json::json!({ "deleted": false, "id": id }), "Cancelled");
    }

    let task = ctx.with_store(|store| store.delete_task(&id))?;
    ctx.report(&task, &format!("Deleted task {}: {}", task.id, task.title))
}

fn run_samples(ctx: &AppContext) -> anyhow::Result<()> {
    let ids = ctx.with_store(|store| store.add_sample_tasks())?;
    ctx.report(&Added { ids: ids.clone() }, &format!("Added {} sample tasks", ids.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use grant_core::error::ErrorCode;
    use grant_core::model::{Category, Priority};
    use grant_core::view::Filter;

    #[derive(Parser)]
    struct AddWrapper {
        #[command(flatten)]
        args: TaskAddArgs,
    }

    #[derive(Parser)]
    struct EditWrapper {
        #[command(flatten)]
        args: TaskEditArgs,
    }

    #[test]
    fn add_args_build_a_draft() {
        let w = AddWrapper::parse_from([
            "test", "Budget draft v1", "--owner", "Dana", "--due", "2026-10-20",
            "--status", "in-progress", "--category", "budget", "--priority", "p1",
        ]);
        let draft = draft_from(&w.args).unwrap();
        assert_eq!(draft.title, "Budget draft v1");
        assert_eq!(draft.owner, "Dana");
        assert_eq!(draft.due, chrono::NaiveDate::from_ymd_opt(2026, 10, 20));
        assert_eq!(draft.status, TaskStatus::InProgress);
        assert_eq!(draft.category, Category::Budget);
        assert_eq!(draft.priority, Priority::P1);
    }

    #[test]
    fn add_defaults_match_the_form() {
        let w = AddWrapper::parse_from(["test", "Outline narrative"]);
        let draft = draft_from(&w.args).unwrap();
        assert_eq!(draft, TaskDraft::new("Outline narrative"));
    }

    #[test]
    fn bad_enum_is_reported_with_code() {
        let w = AddWrapper::parse_from(["test", "x", "--priority", "urgent"]);
        assert_eq!(draft_from(&w.args).unwrap_err().code(), ErrorCode::InvalidEnumValue);
        let w = AddWrapper::parse_from(["test", "x", "--due", "next week"]);
        assert_eq!(draft_from(&w.args).unwrap_err().code(), ErrorCode::InvalidField);
    }

    #[test]
    fn list_filters_parse_all() {
        let args = TaskListArgs {
            search: "budget".into(),
            status: Some("all".into()),
            category: Some("Letters".into()),
        };
        let query = query_from(&args).unwrap();
        assert_eq!(query.status, Filter::All);
        assert_eq!(query.category, Filter::Only(Category::Letters));
    }

    #[test]
    fn edit_requires_a_change() {
        let w = EditWrapper::parse_from(["test", "t-ab12"]);
        assert_eq!(patch_from(&w.args).unwrap_err().code(), ErrorCode::InvalidField);

        let w = EditWrapper::parse_from(["test", "t-ab12", "--clear-due", "--priority", "P3"]);
        let patch = patch_from(&w.args).unwrap();
        assert_eq!(patch.due, Some(None));
        assert_eq!(patch.priority, Some(Priority::P3));

        let w = EditWrapper::parse_from(["test", "t-ab12", "--due", ""]);
        assert_eq!(patch_from(&w.args).unwrap().due, Some(None));
    }

    #[test]
    fn row_cells_mark_overdue() {
        let task = TaskDraft {
            due: chrono::NaiveDate::from_ymd_opt(2026, 10, 1),
            ..TaskDraft::new("Late")
        }
        .into_task(RowId::new_unchecked("t-0001"))
        .unwrap();
        let rows = task_rows(
            &[task],
            &TaskQuery::default(),
            chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        );
        let cells = rows[0].cells();
        assert_eq!(cells[0], "t-0001");
        assert_eq!(cells[3], "2026-10-01 (overdue)");
        assert_eq!(cells[4], "Not started");
    }
}
