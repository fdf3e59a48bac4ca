use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, RowId, date_or_empty, normalize};
use crate::error::GrantError;

/// The four task states, advanced as a ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Advance order: Not started -> In progress -> Blocked -> Done -> Not started.
    pub const RING: [Self; 4] = [Self::NotStarted, Self::InProgress, Self::Blocked, Self::Done];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Blocked => "Blocked",
            Self::Done => "Done",
        }
    }

    /// Next state in the ring, wrapping `Done` back to `NotStarted`.
    #[must_use]
    pub const fn advanced(self) -> Self {
        match self {
            Self::NotStarted => Self::InProgress,
            Self::InProgress => Self::Blocked,
            Self::Blocked => Self::Done,
            Self::Done => Self::NotStarted,
        }
    }
}

/// Task grouping used by the category filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    Narrative,
    Budget,
    Letters,
    Compliance,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Narrative,
        Self::Budget,
        Self::Letters,
        Self::Compliance,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Narrative => "Narrative",
            Self::Budget => "Budget",
            Self::Letters => "Letters",
            Self::Compliance => "Compliance",
            Self::Other => "Other",
        }
    }
}

/// P1 is the most urgent. Variant order is sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    P1,
    #[default]
    P2,
    P3,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "not started" | "notstarted" | "todo" => Ok(Self::NotStarted),
            "in progress" | "inprogress" | "doing" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "done" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "narrative" => Ok(Self::Narrative),
            "budget" => Ok(Self::Budget),
            "letters" => Ok(Self::Letters),
            "compliance" => Ok(Self::Compliance),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "p1" | "1" => Ok(Self::P1),
            "p2" | "2" => Ok(Self::P2),
            "p3" | "3" => Ok(Self::P3),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

/// One grant-preparation to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: RowId,
    pub title: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, with = "date_or_empty")]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Due strictly before `today` and not yet done.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_done() && self.due.is_some_and(|due| due < today)
    }

    pub(crate) fn validate(&self) -> Result<(), GrantError> {
        if self.title.trim().is_empty() {
            return Err(GrantError::invalid("title", "must not be empty"));
        }
        Ok(())
    }
}

/// Fields collected by the "add task" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub owner: String,
    pub due: Option<NaiveDate>,
    pub status: TaskStatus,
    pub category: Category,
    pub priority: Priority,
}

impl TaskDraft {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Trim and validate, producing the task that would be stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::InvalidField`] when the title is blank.
    pub fn into_task(self, id: RowId) -> Result<Task, GrantError> {
        let task = Task {
            id,
            title: self.title.trim().to_string(),
            owner: self.owner.trim().to_string(),
            due: self.due,
            status: self.status,
            category: self.category,
            priority: self.priority,
        };
        task.validate()?;
        Ok(task)
    }
}

/// A structured edit: every `Some` field replaces the stored value.
///
/// The patch is applied to a copy and validated as a whole, so a rejected edit
/// never leaves a half-updated task behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub owner: Option<String>,
    pub due: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl TaskPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the edited task without touching `task`.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::InvalidField`] if the result would have a blank title.
    pub fn applied_to(&self, task: &Task) -> Result<Task, GrantError> {
        let mut next = task.clone();
        if let Some(title) = &self.title {
            next.title = title.trim().to_string();
        }
        if let Some(owner) = &self.owner {
            next.owner = owner.trim().to_string();
        }
        if let Some(due) = self.due {
            next.due = due;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(category) = self.category {
            next.category = category;
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        next.validate()?;
        Ok(next)
    }
}
