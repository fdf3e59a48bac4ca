//! `grant notes`: the free-form notes pad.

use crate::context::AppContext;
use crate::output::render;
use anyhow::Context as _;
use chrono::Local;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum NotesCommand {
    /// Print the notes.
    Show,
    /// Replace the notes.
    Set(NotesSetArgs),
    /// Append a timestamp line to the notes.
    Stamp,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct NotesSetArgs {
    /// New notes text. Use `-` to read from stdin.
    pub text: Option<String>,

    /// Read the notes from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Notes {
    notes: String,
}

#[derive(Debug, Serialize)]
struct Stamped {
    stamp: String,
    notes: String,
}

pub fn run_notes(command: &NotesCommand, ctx: &AppContext) -> anyhow::Result<()> {
    match command {
        NotesCommand::Show => {
            let store = ctx.open_store();
            let notes = Notes {
                notes: store.document().notes.clone(),
            };
            render(ctx.output, &notes, |n, w| {
                if n.notes.is_empty() {
                    if ctx.output.is_pretty() {
                        writeln!(w, "No notes yet. Add some with `grant notes set`.")?;
                    }
                    return Ok(());
                }
                write!(w, "{}", n.notes)?;
                if !n.notes.ends_with('\n') {
                    writeln!(w)?;
                }
                Ok(())
            })
        }
        NotesCommand::Set(args) => {
            let text = read_text(args)?;
            ctx.with_store(|store| store.set_notes(&text))?;
            ctx.report(
                &Notes { notes: text.clone() },
                &format!("Updated notes ({} characters)", text.chars().count()),
            )
        }
        NotesCommand::Stamp => {
            let stamped = ctx.with_store(|store| {
                let stamp = store.stamp_notes(Local::now())?;
                Ok(Stamped {
                    stamp,
                    notes: store.document().notes.clone(),
                })
            })?;
            ctx.report(&stamped, &format!("Stamped notes: {}", stamped.stamp.trim()))
        }
    }
}

fn read_text(args: &NotesSetArgs) -> anyhow::Result<String> {
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    match args.text.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read notes from stdin")?;
            Ok(buf)
        }
        Some(text) => Ok(text.to_string()),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: NotesSetArgs,
    }

    #[test]
    fn set_requires_exactly_one_source() {
        assert!(Wrapper::try_parse_from(["test"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "hello", "--file", "notes.txt"]).is_err());
        let w = Wrapper::parse_from(["test", "call funder"]);
        assert_eq!(read_text(&w.args).unwrap(), "call funder");
    }

    #[test]
    fn set_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline two\n").unwrap();
        let w = Wrapper::parse_from(["test", "--file", path.to_str().unwrap()]);
        assert_eq!(read_text(&w.args).unwrap(), "line one\nline two\n");
    }
}
