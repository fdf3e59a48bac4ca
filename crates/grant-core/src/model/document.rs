use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{BudgetLine, RowId, RowKind, Task, date_or_empty};
use crate::error::GrantError;

/// Grant-level metadata shown in the page header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub name: String,
    #[serde(with = "date_or_empty")]
    pub deadline: Option<NaiveDate>,
}

/// The single persisted object holding all tracker state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub meta: Meta,
    pub tasks: Vec<Task>,
    pub budget: Vec<BudgetLine>,
    pub notes: String,
}

impl Document {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn task(&self, id: &RowId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn task_mut(&mut self, id: &RowId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| &task.id == id)
    }

    #[must_use]
    pub fn budget_line(&self, id: &RowId) -> Option<&BudgetLine> {
        self.budget.iter().find(|line| &line.id == id)
    }

    pub fn budget_line_mut(&mut self, id: &RowId) -> Option<&mut BudgetLine> {
        self.budget.iter_mut().find(|line| &line.id == id)
    }

    /// True if any task or budget line already uses `raw` as its ID.
    #[must_use]
    pub fn id_taken(&self, raw: &str) -> bool {
        self.tasks.iter().any(|task| task.id.as_str() == raw)
            || self.budget.iter().any(|line| line.id.as_str() == raw)
    }

    /// Generate an ID for a new row of `kind` that no existing row uses.
    pub fn fresh_id<R: Rng>(&self, kind: RowKind, rng: &mut R) -> RowId {
        RowId::generate(kind, rng, |candidate| self.id_taken(candidate))
    }

    /// Give every row without an ID (or with a duplicate one) a fresh ID.
    ///
    /// Returns how many rows were (re)assigned.
    pub fn assign_missing_ids<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut seen: HashSet<String> = HashSet::new();
        let mut assigned = 0;

        for idx in 0..self.tasks.len() {
            let current = self.tasks[idx].id.as_str().to_string();
            if current.is_empty() || !seen.insert(current) {
                let id = RowId::generate(RowKind::Task, rng, |c| {
                    seen.contains(c) || self.id_taken(c)
                });
                seen.insert(id.as_str().to_string());
                self.tasks[idx].id = id;
                assigned += 1;
            }
        }

        for idx in 0..self.budget.len() {
            let current = self.budget[idx].id.as_str().to_string();
            if current.is_empty() || !seen.insert(current) {
                let id = RowId::generate(RowKind::Budget, rng, |c| {
                    seen.contains(c) || self.id_taken(c)
                });
                seen.insert(id.as_str().to_string());
                self.budget[idx].id = id;
                assigned += 1;
            }
        }

        assigned
    }

    /// Check every row invariant (non-empty titles/items, valid amounts).
    ///
    /// # Errors
    ///
    /// Returns the first [`GrantError::InvalidField`] encountered.
    pub fn validate(&self) -> Result<(), GrantError> {
        for task in &self.tasks {
            task.validate()?;
        }
        for line in &self.budget {
            line.validate()?;
        }
        Ok(())
    }

    /// Resolve a full or partial task ID (`t-3k9x`, `3k9x`, `3k`).
    ///
    /// # Errors
    ///
    /// [`GrantError::TaskNotFound`] when nothing matches and
    /// [`GrantError::AmbiguousId`] when a prefix matches several tasks.
    pub fn resolve_task_id(&self, input: &str) -> Result<RowId, GrantError> {
        resolve_id(
            self.tasks.iter().map(|task| &task.id),
            RowKind::Task,
            input,
        )
        .map_err(|err| match err {
            Resolve::NotFound => GrantError::TaskNotFound {
                id: input.trim().to_string(),
            },
            Resolve::Ambiguous(count) => GrantError::AmbiguousId {
                prefix: input.trim().to_string(),
                count,
            },
        })
    }

    /// Resolve a full or partial budget line ID (`b-a01z`, `a01z`).
    ///
    /// # Errors
    ///
    /// [`GrantError::BudgetLineNotFound`] or [`GrantError::AmbiguousId`].
    pub fn resolve_budget_id(&self, input: &str) -> Result<RowId, GrantError> {
        resolve_id(
            self.budget.iter().map(|line| &line.id),
            RowKind::Budget,
            input,
        )
        .map_err(|err| match err {
            Resolve::NotFound => GrantError::BudgetLineNotFound {
                id: input.trim().to_string(),
            },
            Resolve::Ambiguous(count) => GrantError::AmbiguousId {
                prefix: input.trim().to_string(),
                count,
            },
        })
    }
}

enum Resolve {
    NotFound,
    Ambiguous(usize),
}

fn resolve_id<'a>(
    ids: impl Iterator<Item = &'a RowId> + Clone,
    kind: RowKind,
    input: &str,
) -> Result<RowId, Resolve> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Resolve::NotFound);
    }

    let prefixed = if input.starts_with(kind.prefix()) {
        input.to_string()
    } else {
        format!("{}{input}", kind.prefix())
    };

    // Exact match first, with or without the kind prefix.
    if let Some(id) = ids
        .clone()
        .find(|id| id.as_str() == input || id.as_str() == prefixed)
    {
        return Ok(id.clone());
    }

    let mut matches: Vec<&RowId> = ids
        .filter(|id| id.as_str().starts_with(&prefixed))
        .collect();

    match matches.len() {
        0 => Err(Resolve::NotFound),
        1 => Ok(matches.remove(0).clone()),
        n => Err(Resolve::Ambiguous(n)),
    }
}
