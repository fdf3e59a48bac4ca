//! `grant chat`: ask the grant assistant, one-shot or interactively.

use crate::context::AppContext;
use crate::output::{OutputMode, render};
use clap::Args;
use grant_core::chat::format::{parse, to_terminal};
use grant_core::chat::{
    ChatSession, CompletionBackend, DEFAULT_SYSTEM_PROMPT, GREETING, HttpCompletionClient,
    SUGGESTED_QUESTIONS, TranscriptEntry,
};
use grant_core::error::GrantError;
use serde::Serialize;
use std::io::{BufRead, IsTerminal, Write};
use tracing::debug;

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Question to ask. Omit to start an interactive session.
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct Reply {
    reply: String,
    messages: usize,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn client_for(ctx: &AppContext) -> HttpCompletionClient {
    let chat = ctx.config.chat.clone().with_env_overrides(env_var);
    let key = chat.resolve_api_key(env_var).map(|(key, source)| {
        debug!(?source, "chat credential resolved");
        key
    });
    HttpCompletionClient::new(chat, key)
}

fn session_for(ctx: &AppContext) -> ChatSession {
    ChatSession::new(
        ctx.config
            .chat
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT),
    )
}

pub fn run_chat(args: &ChatArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let client = client_for(ctx);
    let mut session = session_for(ctx);
    match &args.message {
        Some(message) => ask_once(&mut session, &client, message, ctx.output),
        None => repl(&mut session, &client, ctx.output),
    }
}

/// One turn; a failed request is a command failure.
fn ask_once(
    session: &mut ChatSession,
    backend: &dyn CompletionBackend,
    message: &str,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let Some(request) = session.begin(message) else {
        return Err(GrantError::invalid("message", "must not be empty").into());
    };
    let result = backend.complete(&request.messages);
    if let Err(err) = &result {
        session.finish(Err(err.clone()));
        return Err(GrantError::from(err.clone()).into());
    }
    let reply = match session.finish(result) {
        Some(TranscriptEntry::Assistant(text)) => text.clone(),
        _ => String::new(),
    };

    let styled = mode.is_pretty() && std::io::stdout().is_terminal();
    let out = Reply {
        reply,
        messages: session.message_count(),
    };
    render(mode, &out, |r, w| writeln!(w, "{}", to_terminal(&parse(&r.reply), styled)))
}

/// Map `1`..`4` to the suggested questions; anything else is sent as typed.
fn expand_shortcut(line: &str) -> &str {
    line.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| SUGGESTED_QUESTIONS.get(idx).copied())
        .unwrap_or(line)
}

fn write_entry(out: &mut dyn Write, entry: &TranscriptEntry, styled: bool) -> std::io::Result<()> {
    match entry {
        TranscriptEntry::Assistant(text) => {
            writeln!(out, "assistant> {}", to_terminal(&parse(text), styled))
        }
        TranscriptEntry::Error(message) => writeln!(out, "error: {message}"),
        TranscriptEntry::User(_) | TranscriptEntry::Typing => Ok(()),
    }
}

/// Interactive loop. Failures show inline and the session continues.
fn repl(
    session: &mut ChatSession,
    backend: &dyn CompletionBackend,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let styled = mode.is_pretty() && std::io::stdout().is_terminal();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "assistant> {}", to_terminal(&parse(GREETING), styled))?;
    writeln!(out)?;
    writeln!(out, "Suggested questions (type the number):")?;
    for (idx, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        writeln!(out, "  {}. {question}", idx + 1)?;
    }
    writeln!(out, "Type /quit to leave.")?;
    out.flush()?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            eprint!("you> ");
            std::io::stderr().flush()?;
        }
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        if matches!(line, "/quit" | "/exit") {
            break;
        }

        let Some(request) = session.begin(expand_shortcut(line)) else {
            continue;
        };
        if interactive {
            eprint!("assistant is typing...");
            std::io::stderr().flush()?;
        }
        let result = backend.complete(&request.messages);
        if interactive {
            eprint!("\r\x1b[K");
        }
        if let Some(entry) = session.finish(result) {
            write_entry(&mut out, entry, styled)?;
        }
        out.flush()?;
    }

    writeln!(out, "{} messages", session.message_count())?;
    Ok(())
}
