//! The state store: one in-memory [`Document`] backed by one persistent slot.
//!
//! Every mutation goes through a [`Store`] method, which applies the change,
//! writes a full-document snapshot to the slot, stamps the last-saved time,
//! and then notifies subscribers so dependent views can refresh. There are no
//! partial writes, no transactions, and no migrations: the slot always holds
//! the complete document.
//!
//! Loading never fails. A missing slot yields an empty document and an
//! unreadable or unparsable one is logged and ignored, keeping defaults.

use chrono::{DateTime, Local, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::GrantError;
use crate::lock::StoreLock;
use crate::model::{
    BudgetDraft, BudgetLine, BudgetPatch, Document, FundingStatus, RowId, RowKind, Task,
    TaskDraft, TaskPatch, TaskStatus, Category, Priority,
};

/// Storage key of the tracker document; also the default file stem.
pub const STORAGE_KEY: &str = "grant-tracker.v1";

/// Display format for timestamps written into notes and the saved banner.
pub const LOCAL_STAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Fixed seed so rows without IDs get the same IDs on every load until the
/// next save persists them.
const LEGACY_ID_SEED: u64 = 0x6772_616e_74;

/// A persistent key-value slot holding one serialized document.
pub trait Slot {
    /// Read the raw stored value, `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the slot exists but cannot be read.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replace the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::StorageWrite`] when the value cannot be written.
    fn write(&mut self, contents: &str) -> Result<(), GrantError>;

    /// Remove the stored value entirely.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::StorageWrite`] when removal fails.
    fn remove(&mut self) -> Result<(), GrantError>;

    /// Copy the stored value aside before it is overwritten, returning where
    /// it went. `None` when there was nothing to keep.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::StorageWrite`] when the copy fails.
    fn quarantine(&mut self) -> Result<Option<String>, GrantError>;

    /// Human-readable location, for logs and `grant config`.
    fn describe(&self) -> String;
}

/// A slot stored as a JSON file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file next to the slot.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Take the exclusive writer lock for this slot.
    ///
    /// # Errors
    ///
    /// See [`StoreLock::acquire`].
    pub fn lock(&self, timeout: Duration) -> Result<StoreLock, GrantError> {
        Ok(StoreLock::acquire(&self.lock_path(), timeout)?)
    }

    /// Where an unreadable slot is copied before the next save.
    #[must_use]
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: io::Error) -> GrantError {
        GrantError::StorageWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl Slot for FileSlot {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), GrantError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.write_error(err))?;
        }

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        fs::write(&tmp, contents).map_err(|err| self.write_error(err))?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.write_error(err));
        }
        Ok(())
    }

    fn remove(&mut self) -> Result<(), GrantError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.write_error(err)),
        }
    }

    fn quarantine(&mut self) -> Result<Option<String>, GrantError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.corrupt_path();
        fs::copy(&self.path, &backup).map_err(|err| self.write_error(err))?;
        Ok(Some(backup.display().to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory slot, used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    value: Option<String>,
    quarantined: Option<String>,
    writes: usize,
}

impl MemorySlot {
    #[must_use]
    pub fn with_value(raw: impl Into<String>) -> Self {
        Self {
            value: Some(raw.into()),
            quarantined: None,
            writes: 0,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Value set aside by [`Slot::quarantine`].
    #[must_use]
    pub fn quarantined(&self) -> Option<&str> {
        self.quarantined.as_deref()
    }

    /// Number of successful writes since creation.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.value.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), GrantError> {
        self.value = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), GrantError> {
        self.value = None;
        Ok(())
    }

    fn quarantine(&mut self) -> Result<Option<String>, GrantError> {
        self.quarantined.clone_from(&self.value);
        Ok(self.value.as_ref().map(|_| "memory.corrupt".to_string()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// What [`Store::open`] found in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet; the document starts empty.
    Empty,
    /// A stored document was restored.
    Restored,
    /// The stored value could not be read or parsed; defaults were kept.
    /// The first save copies it aside before overwriting.
    Ignored,
}

/// Passed to subscribers after every successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReceipt {
    pub saved_at: DateTime<Local>,
}

type Subscriber = Box<dyn FnMut(&Document, &SaveReceipt)>;

/// Explicit single-writer store over a [`Slot`].
pub struct Store<S: Slot> {
    slot: S,
    doc: Document,
    outcome: LoadOutcome,
    quarantine_pending: bool,
    last_saved: Option<DateTime<Local>>,
    subscribers: Vec<Subscriber>,
}

impl<S: Slot> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("slot", &self.slot.describe())
            .field("outcome", &self.outcome)
            .field("last_saved", &self.last_saved)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<S: Slot> Store<S> {
    /// Restore the document from `slot`, keeping defaults on any failure.
    pub fn open(slot: S) -> Self {
        let (doc, outcome) = load_document(&slot);
        Self {
            slot,
            doc,
            outcome,
            quarantine_pending: outcome == LoadOutcome::Ignored,
            last_saved: None,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub const fn load_outcome(&self) -> LoadOutcome {
        self.outcome
    }

    #[must_use]
    pub const fn last_saved(&self) -> Option<DateTime<Local>> {
        self.last_saved
    }

    #[must_use]
    pub const fn slot(&self) -> &S {
        &self.slot
    }

    #[must_use]
    pub fn task(&self, id: &RowId) -> Option<&Task> {
        self.doc.task(id)
    }

    #[must_use]
    pub fn budget_line(&self, id: &RowId) -> Option<&BudgetLine> {
        self.doc.budget_line(id)
    }

    /// Register a callback run after every save (last-saved, progress, totals).
    pub fn subscribe(&mut self, callback: impl FnMut(&Document, &SaveReceipt) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    /// Write the full document to the slot, then notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::StorageWrite`] or [`GrantError::Serialize`].
    pub fn save(&mut self) -> Result<SaveReceipt, GrantError> {
        let snapshot = serde_json::to_string(&self.doc)?;
        self.write_snapshot(&snapshot)?;
        Ok(self.saved(snapshot.len()))
    }

    /// Apply an arbitrary mutation, then persist.
    ///
    /// The mutation runs on a copy. The copy becomes the live document only
    /// once the slot holds it, so a closure error or a failed write leaves
    /// both untouched.
    ///
    /// # Errors
    ///
    /// The closure's error, or any error from [`Store::save`].
    pub fn update<R>(
        &mut self,
        mutate: impl FnOnce(&mut Document) -> Result<R, GrantError>,
    ) -> Result<R, GrantError> {
        let mut next = self.doc.clone();
        let value = mutate(&mut next)?;
        let snapshot = serde_json::to_string(&next)?;
        self.write_snapshot(&snapshot)?;
        self.doc = next;
        self.saved(snapshot.len());
        Ok(value)
    }

    fn write_snapshot(&mut self, snapshot: &str) -> Result<(), GrantError> {
        if self.quarantine_pending {
            if let Some(backup) = self.slot.quarantine()? {
                warn!(
                    slot = %self.slot.describe(),
                    backup = %backup,
                    "unreadable tracker copied aside before overwrite"
                );
            }
            self.quarantine_pending = false;
        }
        self.slot.write(snapshot)
    }

    fn saved(&mut self, bytes: usize) -> SaveReceipt {
        let receipt = SaveReceipt {
            saved_at: Local::now(),
        };
        self.last_saved = Some(receipt.saved_at);
        debug!(
            slot = %self.slot.describe(),
            bytes,
            tasks = self.doc.tasks.len(),
            budget = self.doc.budget.len(),
            "document saved"
        );

        for subscriber in &mut self.subscribers {
            subscriber(&self.doc, &receipt);
        }
        receipt
    }

    /// Set the grant name.
    ///
    /// # Errors
    ///
    /// Propagates save failures.
    pub fn set_name(&mut self, name: &str) -> Result<(), GrantError> {
        let name = name.to_string();
        self.update(|doc| {
            doc.meta.name = name;
            Ok(())
        })
    }

    /// Set or clear the submission deadline.
    ///
    /// # Errors
    ///
    /// Propagates save failures.
    pub fn set_deadline(&mut self, deadline: Option<NaiveDate>) -> Result<(), GrantError> {
        self.update(|doc| {
            doc.meta.deadline = deadline;
            Ok(())
        })
    }

    /// Append a task built from `draft`; a blank title is rejected unsaved.
    ///
    /// # Errors
    ///
    /// [`GrantError::InvalidField`] for a blank title, or save failures.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<RowId, GrantError> {
        self.update(|doc| {
            let id = doc.fresh_id(RowKind::Task, &mut rand::thread_rng());
            let task = draft.into_task(id.clone())?;
            info!(id = %id, title = %task.title, "task added");
            doc.tasks.push(task);
            Ok(id)
        })
    }

    /// Append the four starter tasks.
    ///
    /// # Errors
    ///
    /// Propagates save failures.
    pub fn add_sample_tasks(&mut self) -> Result<Vec<RowId>, GrantError> {
        self.update(|doc| {
            let mut rng = rand::thread_rng();
            let mut ids = Vec::new();
            for draft in sample_tasks() {
                let id = doc.fresh_id(RowKind::Task, &mut rng);
                doc.tasks.push(draft.into_task(id.clone())?);
                ids.push(id);
            }
            Ok(ids)
        })
    }

    /// Move a task to the next status in the ring.
    ///
    /// # Errors
    ///
    /// [`GrantError::TaskNotFound`], or save failures.
    pub fn advance_task(&mut self, id: &RowId) -> Result<TaskStatus, GrantError> {
        self.update(|doc| {
            let task = doc.task_mut(id).ok_or_else(|| GrantError::TaskNotFound {
                id: id.to_string(),
            })?;
            task.status = task.status.advanced();
            debug!(id = %id, status = %task.status, "task advanced");
            Ok(task.status)
        })
    }

    /// Apply a structured edit to a task, all fields or none.
    ///
    /// # Errors
    ///
    /// [`GrantError::TaskNotFound`], [`GrantError::InvalidField`], or save
    /// failures.
    pub fn edit_task(&mut self, id: &RowId, patch: &TaskPatch) -> Result<Task, GrantError> {
        self.update(|doc| {
            let task = doc.task_mut(id).ok_or_else(|| GrantError::TaskNotFound {
                id: id.to_string(),
            })?;
            *task = patch.applied_to(task)?;
            Ok(task.clone())
        })
    }

    /// Remove a task by ID, returning it.
    ///
    /// # Errors
    ///
    /// [`GrantError::TaskNotFound`], or save failures.
    pub fn delete_task(&mut self, id: &RowId) -> Result<Task, GrantError> {
        self.update(|doc| {
            let idx = doc
                .tasks
                .iter()
                .position(|task| &task.id == id)
                .ok_or_else(|| GrantError::TaskNotFound { id: id.to_string() })?;
            let removed = doc.tasks.remove(idx);
            info!(id = %id, title = %removed.title, "task deleted");
            Ok(removed)
        })
    }

    /// Append a budget line; blank items and bad amounts are rejected unsaved.
    ///
    /// # Errors
    ///
    /// [`GrantError::InvalidField`], or save failures.
    pub fn add_budget_line(&mut self, draft: BudgetDraft) -> Result<RowId, GrantError> {
        self.update(|doc| {
            let id = doc.fresh_id(RowKind::Budget, &mut rand::thread_rng());
            let line = draft.into_line(id.clone())?;
            info!(id = %id, item = %line.item, amount = line.amount, "budget line added");
            doc.budget.push(line);
            Ok(id)
        })
    }

    /// Flip a budget line between secured and pending.
    ///
    /// # Errors
    ///
    /// [`GrantError::BudgetLineNotFound`], or save failures.
    pub fn toggle_budget_line(&mut self, id: &RowId) -> Result<FundingStatus, GrantError> {
        self.update(|doc| {
            let line = doc
                .budget_line_mut(id)
                .ok_or_else(|| GrantError::BudgetLineNotFound { id: id.to_string() })?;
            line.status = line.status.toggled();
            Ok(line.status)
        })
    }

    /// Apply a structured edit to a budget line, all fields or none.
    ///
    /// # Errors
    ///
    /// [`GrantError::BudgetLineNotFound`], [`GrantError::InvalidField`], or
    /// save failures.
    pub fn edit_budget_line(
        &mut self,
        id: &RowId,
        patch: &BudgetPatch,
    ) -> Result<BudgetLine, GrantError> {
        self.update(|doc| {
            let line = doc
                .budget_line_mut(id)
                .ok_or_else(|| GrantError::BudgetLineNotFound { id: id.to_string() })?;
            *line = patch.applied_to(line)?;
            Ok(line.clone())
        })
    }

    /// Remove a budget line by ID, returning it.
    ///
    /// # Errors
    ///
    /// [`GrantError::BudgetLineNotFound`], or save failures.
    pub fn delete_budget_line(&mut self, id: &RowId) -> Result<BudgetLine, GrantError> {
        self.update(|doc| {
            let idx = doc
                .budget
                .iter()
                .position(|line| &line.id == id)
                .ok_or_else(|| GrantError::BudgetLineNotFound { id: id.to_string() })?;
            let removed = doc.budget.remove(idx);
            info!(id = %id, item = %removed.item, "budget line deleted");
            Ok(removed)
        })
    }

    /// Replace the free-form notes.
    ///
    /// # Errors
    ///
    /// Propagates save failures.
    pub fn set_notes(&mut self, notes: &str) -> Result<(), GrantError> {
        let notes = notes.to_string();
        self.update(|doc| {
            doc.notes = notes;
            Ok(())
        })
    }

    /// Append a `[timestamp] ` marker to the notes, on a new paragraph when
    /// the notes are non-empty. Returns the marker text.
    ///
    /// # Errors
    ///
    /// Propagates save failures.
    pub fn stamp_notes(&mut self, now: DateTime<Local>) -> Result<String, GrantError> {
        let stamp = format!("[{}] ", now.format(LOCAL_STAMP_FORMAT));
        self.update(|doc| {
            if !doc.notes.is_empty() {
                doc.notes.push_str("\n\n");
            }
            doc.notes.push_str(&stamp);
            Ok(stamp.clone())
        })
    }

    /// Swap in a whole document (import). Rows are validated and given IDs
    /// before anything changes.
    ///
    /// # Errors
    ///
    /// [`GrantError::InvalidField`] if a row breaks an invariant, or save
    /// failures.
    pub fn replace(&mut self, mut incoming: Document) -> Result<(), GrantError> {
        incoming.validate()?;
        incoming.assign_missing_ids(&mut rand::thread_rng());
        self.update(|doc| {
            *doc = incoming;
            Ok(())
        })
    }

    /// Delete the stored document and reset to empty.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::StorageWrite`] if the slot cannot be removed.
    pub fn clear(&mut self) -> Result<(), GrantError> {
        self.slot.remove()?;
        self.doc = Document::default();
        self.outcome = LoadOutcome::Empty;
        self.quarantine_pending = false;
        self.last_saved = None;
        info!(slot = %self.slot.describe(), "tracker data cleared");
        Ok(())
    }
}

fn load_document(slot: &impl Slot) -> (Document, LoadOutcome) {
    let raw = match slot.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Document::default(), LoadOutcome::Empty),
        Err(err) => {
            warn!(slot = %slot.describe(), error = %err, "stored tracker unreadable; using defaults");
            return (Document::default(), LoadOutcome::Ignored);
        }
    };

    match serde_json::from_str::<Document>(&raw) {
        Ok(mut doc) => {
            let assigned = doc.assign_missing_ids(&mut StdRng::seed_from_u64(LEGACY_ID_SEED));
            if assigned > 0 {
                debug!(assigned, "assigned IDs to rows stored without one");
            }
            (doc, LoadOutcome::Restored)
        }
        Err(err) => {
            warn!(slot = %slot.describe(), error = %err, "stored tracker corrupt; using defaults");
            (Document::default(), LoadOutcome::Ignored)
        }
    }
}

/// Starter tasks offered to a fresh tracker.
#[must_use]
pub fn sample_tasks() -> Vec<TaskDraft> {
    let draft = |title: &str, status, category, priority| TaskDraft {
        title: title.to_string(),
        status,
        category,
        priority,
        ..TaskDraft::default()
    };
    vec![
        draft(
            "Outline narrative",
            TaskStatus::NotStarted,
            Category::Narrative,
            Priority::P1,
        ),
        draft(
            "Budget draft v1",
            TaskStatus::InProgress,
            Category::Budget,
            Priority::P1,
        ),
        draft(
            "Letters of support – reach out",
            TaskStatus::NotStarted,
            Category::Letters,
            Priority::P2,
        ),
        draft(
            "Eligibility check – GitLab Foundation FAQ",
            TaskStatus::Done,
            Category::Compliance,
            Priority::P2,
        ),
    ]
}
