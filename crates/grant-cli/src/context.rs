//! Per-invocation settings shared by every command: merged config, store
//! location, output mode, and the locked load/mutate/save cycle.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use grant_core::config::{self, UserConfig};
use grant_core::error::{ErrorCode, GrantError};
use grant_core::store::{FileSlot, LoadOutcome, Store};
use serde::Serialize;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

use crate::output::{CliError, OutputMode, render_outcome, render_saved, resolve_output_mode};

/// Global flags that influence how the context is built.
#[derive(Debug, Clone, Copy)]
pub struct GlobalFlags<'a> {
    pub format: Option<OutputMode>,
    pub json: bool,
    pub store: Option<&'a Path>,
    pub quiet: bool,
}

#[derive(Debug)]
pub struct AppContext {
    pub config_path: Option<PathBuf>,
    pub config: UserConfig,
    pub store_path: PathBuf,
    pub output: OutputMode,
    pub quiet: bool,
    last_saved: Rc<Cell<Option<DateTime<Local>>>>,
}

/// Config loading failed; carries the mode to render the error in.
#[derive(Debug)]
pub struct ConfigLoadError {
    pub output: OutputMode,
    pub error: CliError,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl AppContext {
    /// Merge config file, environment, and flags.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigLoadError`] (E1001) when the config file exists but
    /// does not parse.
    pub fn load(flags: GlobalFlags<'_>) -> Result<Self, ConfigLoadError> {
        let config_path = config::user_config_path(env_var);
        let config = config::load_user_config(config_path.as_deref()).map_err(|err| {
            let code = ErrorCode::ConfigParseError;
            ConfigLoadError {
                output: resolve_output_mode(flags.format, flags.json, None),
                error: CliError::with_details(
                    format!("{err:#}"),
                    code.hint().unwrap_or(code.message()),
                    code.code(),
                ),
            }
        })?;

        let store_path = config::resolve_store_path(flags.store, env_var, &config);
        let output = resolve_output_mode(flags.format, flags.json, config.output.as_deref());
        debug!(store = %store_path.display(), ?output, "context resolved");

        Ok(Self {
            config_path,
            config,
            store_path,
            output,
            quiet: flags.quiet,
            last_saved: Rc::default(),
        })
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.config.storage.lock_timeout_ms)
    }

    /// Open the store for reading. No lock is taken.
    pub fn open_store(&self) -> Store<FileSlot> {
        Store::open(FileSlot::new(&self.store_path))
    }

    /// Run `f` against the store while holding the writer lock, so the
    /// load/mutate/save cycle cannot interleave with another process.
    ///
    /// # Errors
    ///
    /// Returns lock contention, or whatever `f` returns.
    pub fn with_store<R>(
        &self,
        f: impl FnOnce(&mut Store<FileSlot>) -> Result<R, GrantError>,
    ) -> Result<R> {
        let slot = FileSlot::new(&self.store_path);
        let lock = slot.lock(self.lock_timeout())?;

        let mut store = Store::open(slot);
        if store.load_outcome() == LoadOutcome::Ignored {
            info!(
                store = %self.store_path.display(),
                "starting from an empty tracker; the unreadable file is kept as .corrupt on save"
            );
        }
        let last_saved = Rc::clone(&self.last_saved);
        store.subscribe(move |doc, receipt| {
            last_saved.set(Some(receipt.saved_at));
            debug!(
                tasks = doc.tasks.len(),
                budget_lines = doc.budget.len(),
                saved_at = %receipt.saved_at.to_rfc3339(),
                "tracker saved"
            );
        });

        let result = f(&mut store)?;
        lock.release();
        Ok(result)
    }

    /// When this invocation last wrote the store, if it did.
    pub fn last_saved(&self) -> Option<DateTime<Local>> {
        self.last_saved.get()
    }

    /// Render a command outcome, with the saved banner once the store was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns output write failures.
    pub fn report<T: Serialize>(&self, value: &T, message: &str) -> Result<()> {
        match self.last_saved() {
            Some(at) => render_saved(self.output, self.quiet, value, message, at),
            None => render_outcome(self.output, self.quiet, value, message),
        }
    }
}

/// Modification time of the store file, as the last-saved time seen by
/// later invocations.
pub fn stored_at(path: &Path) -> Option<DateTime<Local>> {
    let modified = std::fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(modified))
}

/// Local calendar date used for overdue and countdown rendering.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grant_core::model::TaskDraft;

    fn context_for(store_path: PathBuf) -> AppContext {
        AppContext {
            config_path: None,
            config: UserConfig::default(),
            store_path,
            output: OutputMode::Json,
            quiet: false,
            last_saved: Rc::default(),
        }
    }

    #[test]
    fn with_store_persists_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_for(dir.path().join("nested").join("tracker.json"));

        let id = ctx
            .with_store(|store| store.add_task(TaskDraft::new("Outline narrative")))
            .unwrap();

        let reopened = ctx.open_store();
        assert_eq!(reopened.load_outcome(), LoadOutcome::Restored);
        assert_eq!(reopened.task(&id).unwrap().title, "Outline narrative");
        // The lock is released, so a second writer gets in.
        ctx.with_store(|store| store.set_notes("second writer")).unwrap();
    }

    #[test]
    fn saves_are_stamped_for_reporting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        let ctx = context_for(path.clone());
        assert!(ctx.last_saved().is_none());
        assert!(stored_at(&path).is_none());

        ctx.with_store(|store| store.set_name("Producers Lab")).unwrap();
        assert!(ctx.last_saved().is_some());
        assert!(stored_at(&path).is_some());
    }

    #[test]
    fn failed_mutation_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_for(dir.path().join("tracker.json"));
        ctx.with_store(|store| store.set_notes("keep me")).unwrap();

        let err = ctx
            .with_store(|store| store.add_task(TaskDraft::new("   ")))
            .unwrap_err();
        assert!(err.downcast_ref::<GrantError>().is_some());
        assert_eq!(ctx.open_store().document().notes, "keep me");
    }
}
