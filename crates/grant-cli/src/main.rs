#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use context::{AppContext, GlobalFlags};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "grant",
    author,
    version,
    about = "grant: track a grant application's tasks, budget, notes, and deadline",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (overridden by GRANT_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (pretty, text, json).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Tracker file to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Show the grant summary",
        long_about = "Show the grant name, deadline countdown, task progress, and budget totals.",
        after_help = "EXAMPLES:\n    # Summary for humans\n    grant status\n\n    # Emit machine-readable output\n    grant status --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        subcommand,
        next_help_heading = "Grant",
        about = "Set the grant name and deadline",
        long_about = "Set the grant name (used for export and report file names) and the submission deadline.",
        after_help = "EXAMPLES:\n    # Name the grant and set its deadline\n    grant meta set --name \"Baltimore AI Producers Lab\" --deadline 2026-11-01\n\n    # Remove the deadline\n    grant meta set --clear-deadline"
    )]
    Meta(cmd::meta::MetaCommand),

    #[command(
        subcommand,
        next_help_heading = "Tasks",
        about = "Manage tasks",
        long_about = "Add, list, advance, edit, and delete grant-preparation tasks. Tasks are addressed by ID or a unique ID prefix.",
        after_help = "EXAMPLES:\n    # Add a task\n    grant task add \"Outline narrative\" --owner Dana --due 2026-10-20 --priority P1\n\n    # List blocked budget tasks\n    grant task list --status blocked --category budget\n\n    # Move a task to its next status\n    grant task advance t-a01z\n\n    # Start from the sample tasks\n    grant task samples"
    )]
    Task(cmd::task::TaskCommand),

    #[command(
        subcommand,
        next_help_heading = "Budget",
        about = "Manage budget lines",
        long_about = "Add, list, toggle, edit, and delete budget lines, with total, secured, and gap.",
        after_help = "EXAMPLES:\n    # Add a pending line\n    grant budget add \"Mac Studio\" 35000\n\n    # Mark it secured\n    grant budget toggle b-k2m9\n\n    # Show lines and totals\n    grant budget list"
    )]
    Budget(cmd::budget::BudgetCommand),

    #[command(
        subcommand,
        next_help_heading = "Notes",
        about = "Read and write the notes pad",
        after_help = "EXAMPLES:\n    # Replace the notes\n    grant notes set \"Call program officer on Monday\"\n\n    # Append a timestamp to start a new entry\n    grant notes stamp\n\n    # Print the notes\n    grant notes show"
    )]
    Notes(cmd::notes::NotesCommand),

    #[command(
        next_help_heading = "Data",
        about = "Export the tracker to JSON",
        long_about = "Write the whole tracker as pretty-printed JSON, by default to <grant-name>.json in the current directory.",
        after_help = "EXAMPLES:\n    # Export next to you\n    grant export\n\n    # Export to a chosen file\n    grant export --output backup.json\n\n    # Pipe the export\n    grant export --stdout | jq .tasks"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Data",
        about = "Replace the tracker with an exported file",
        long_about = "Replace the grant details, tasks, budget, and notes with the contents of an export. Invalid files are rejected and nothing changes.",
        after_help = "EXAMPLES:\n    # Restore from a backup\n    grant import backup.json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Data",
        about = "Write a printable HTML report",
        long_about = "Write a self-contained HTML report (progress ring, task table, budget with totals, notes) to print to PDF from a browser.",
        after_help = "EXAMPLES:\n    # Report next to you\n    grant print\n\n    # Choose the file\n    grant print --output report.html"
    )]
    Print(cmd::print::PrintArgs),

    #[command(
        next_help_heading = "Data",
        about = "Delete all stored tracker data",
        after_help = "EXAMPLES:\n    # Clear after confirming\n    grant clear\n\n    # Clear without a prompt\n    grant clear --yes"
    )]
    Clear(cmd::clear::ClearArgs),

    #[command(
        next_help_heading = "Assistant",
        about = "Ask the grant assistant",
        long_about = "Ask a question about the grant. Without a message, start an interactive session. Needs GRANT_CHAT_API_KEY unless chat.endpoint is a proxy that holds the credential.",
        after_help = "EXAMPLES:\n    # One question\n    grant chat \"Who is the target population?\"\n\n    # Interactive session\n    grant chat"
    )]
    Chat(cmd::chat::ChatArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show the effective configuration",
        after_help = "EXAMPLES:\n    # Where is my data?\n    grant config\n\n    # Emit machine-readable output\n    grant config --json"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    grant completions bash > ~/.local/share/bash-completion/completions/grant\n\n    # Zsh\n    grant completions zsh > ~/.zfunc/_grant"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Cli {
    fn flags(&self) -> GlobalFlags<'_> {
        GlobalFlags {
            format: self.format,
            json: self.json,
            store: self.store.as_deref(),
            quiet: self.quiet,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("GRANT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "grant=debug,info"
        } else {
            "grant=info,warn"
        })
    });

    let format = env::var("GRANT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Status(args) => cmd::status::run_status(args, ctx),
        Commands::Meta(command) => cmd::meta::run_meta(command, ctx),
        Commands::Task(command) => cmd::task::run_task(command, ctx),
        Commands::Budget(command) => cmd::budget::run_budget(command, ctx),
        Commands::Notes(command) => cmd::notes::run_notes(command, ctx),
        Commands::Export(args) => cmd::export::run_export(args, ctx),
        Commands::Import(args) => cmd::import::run_import(args, ctx),
        Commands::Print(args) => cmd::print::run_print(args, ctx),
        Commands::Clear(args) => cmd::clear::run_clear(args, ctx),
        Commands::Chat(args) => cmd::chat::run_chat(args, ctx),
        Commands::Config(args) => cmd::config::run_config(args, ctx),
        Commands::Completions(args) => cmd::completions::run_completions(args, &mut Cli::command()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match AppContext::load(cli.flags()) {
        Ok(ctx) => ctx,
        Err(err) => {
            let _ = render_error(err.output, &err.error);
            return ExitCode::FAILURE;
        }
    };
    debug!(command = ?cli.command, "dispatching");

    match run(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = render_error(ctx.output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}
