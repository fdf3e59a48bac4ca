//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: aligned tables and sections for humans, tab-separated rows
//! for scripts, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / `--json` flag
//! 2. `FORMAT` env var (`pretty` | `text` | `json`)
//! 3. `output` in the user config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use chrono::{DateTime, Local};
use clap::ValueEnum;
use grant_core::config::normalize_output_mode;
use grant_core::error::GrantError;
use grant_core::store::LOCAL_STAMP_FORMAT;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (tables, sections, visual framing).
    Pretty,
    /// Tab-separated rows for pipes and scripts.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Returns `true` if pretty output was requested.
    pub const fn is_pretty(self) -> bool {
        matches!(self, Self::Pretty)
    }

    fn from_name(raw: &str) -> Option<Self> {
        match normalize_output_mode(raw)? {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => Some(Self::Pretty),
        }
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    config_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next source.
    if let Some(mode) = format_env.and_then(OutputMode::from_name) {
        return mode;
    }
    if let Some(mode) = config_output.and_then(OutputMode::from_name) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, config, and TTY.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    config_output: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(
        format_flag,
        json_flag,
        env_val.as_deref(),
        config_output,
        is_tty,
    )
}

/// A row type that can be rendered as part of a table in every mode.
pub trait Renderable: Serialize {
    /// Column headers, in the same order as [`Renderable::cells`].
    fn table_headers() -> &'static [&'static str];

    /// Cell values for one row.
    fn cells(&self) -> Vec<String>;
}

/// Render rows as an aligned table (pretty), TSV (text), or a JSON array.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode, empty: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_list(&mut out, items, mode, empty)
}

fn write_list<R: Renderable>(
    out: &mut dyn Write,
    items: &[R],
    mode: OutputMode,
    empty: &str,
) -> io::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, items)?;
            writeln!(out)
        }
        OutputMode::Text => {
            for item in items {
                writeln!(out, "{}", item.cells().join("\t"))?;
            }
            Ok(())
        }
        OutputMode::Pretty => {
            if items.is_empty() {
                return writeln!(out, "{empty}");
            }
            let headers = R::table_headers();
            let rows: Vec<Vec<String>> = items.iter().map(Renderable::cells).collect();
            let widths: Vec<usize> = (0..headers.len())
                .map(|col| {
                    rows.iter()
                        .filter_map(|row| row.get(col))
                        .map(|cell| cell.chars().count())
                        .chain(std::iter::once(headers[col].chars().count()))
                        .max()
                        .unwrap_or(0)
                })
                .collect();

            write_aligned(out, headers.iter().copied(), &widths)?;
            let rule = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
            writeln!(out, "{:-<rule$}", "")?;
            for row in &rows {
                write_aligned(out, row.iter().map(String::as_str), &widths)?;
            }
            Ok(())
        }
    }
}

fn write_aligned<'a>(
    out: &mut dyn Write,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> io::Result<()> {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    writeln!(out, "{}", line.trim_end())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

impl From<&GrantError> for CliError {
    fn from(err: &GrantError) -> Self {
        Self::with_details(err.to_string(), err.suggestion(), err.code().code())
    }
}

impl From<&anyhow::Error> for CliError {
    /// Library errors keep their code and hint; anything else is reported
    /// with its full context chain.
    fn from(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<GrantError>())
            .map_or_else(|| Self::new(format!("{err:#}")), Self::from)
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In pretty/text mode,
/// the provided `human_fn` closure is called to produce text output.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a success message to stdout; suppressed by `--quiet` outside JSON.
pub fn render_success(mode: OutputMode, quiet: bool, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "ok": true,
                "message": message,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty if !quiet => writeln!(out, "✓ {message}")?,
        OutputMode::Text if !quiet => writeln!(out, "{message}")?,
        OutputMode::Pretty | OutputMode::Text => {}
    }
    Ok(())
}

/// JSON callers get `value`; humans get the one-line `message`.
pub fn render_outcome<T: Serialize>(
    mode: OutputMode,
    quiet: bool,
    value: &T,
    message: &str,
) -> anyhow::Result<()> {
    if mode.is_json() {
        render(mode, value, |_, _| Ok(()))
    } else {
        render_success(mode, quiet, message)
    }
}

/// A mutation result tagged with when it reached the store.
#[derive(Debug, Serialize)]
pub struct SavedOutcome<'a, T: Serialize> {
    #[serde(flatten)]
    pub value: &'a T,
    pub saved_at: DateTime<Local>,
}

/// `Saved 10/16/2026, 3:04:05 PM`
pub fn saved_banner(at: DateTime<Local>) -> String {
    format!("Saved {}", at.format(LOCAL_STAMP_FORMAT))
}

/// [`render_outcome`] for a command that wrote the store: JSON gains
/// `saved_at`, humans get the saved banner under the message.
pub fn render_saved<T: Serialize>(
    mode: OutputMode,
    quiet: bool,
    value: &T,
    message: &str,
    saved_at: DateTime<Local>,
) -> anyhow::Result<()> {
    render_outcome(
        mode,
        quiet,
        &SavedOutcome { value, saved_at },
        &format!("{message}\n{}", saved_banner(saved_at)),
    )
}
