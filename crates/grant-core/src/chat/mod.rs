//! Grant assistant chat session.
//!
//! The session keeps its own rolling history, independent of the tracker
//! document, and never persists it. Each user message produces exactly one
//! completion request. A send is split into [`ChatSession::begin`] (build the
//! request, mark busy, show the typing placeholder) and
//! [`ChatSession::finish`] (swap the placeholder for the reply or an inline
//! error, clear busy); [`ChatSession::send`] runs both against a backend.

pub mod client;
pub mod format;

pub use client::{ChatError, CompletionBackend, HttpCompletionClient};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many prior turns accompany each new message.
pub const CONTEXT_TURNS: usize = 6;

/// Opening message shown before the first question.
pub const GREETING: &str =
    "Hi! I'm here to answer questions about the Baltimore AI Producers Lab grant application.";

/// Example questions offered under the greeting.
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What makes this program unique?",
    "How much does it cost per family?",
    "What's the technical infrastructure?",
    "Who is the target population?",
];

/// Grant context sent as the system message of every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant for the Baltimore AI Producers Lab grant application.

PROGRAM OVERVIEW:
- 30 families (up to 100 Baltimore residents total)
- $250,000 total budget ($8,333 per family for Year 1 pilot)
- 6-month program teaching families to BUILD AI tools (not just use them)
- Starting at age 14, family-based learning approach
- Producer-first mindset: create AI tools, don't just consume them

KEY INNOVATIONS:
- Start young (age 14) before consumer habits form
- Family learning model (entire households learn together)
- Local models (work offline, true ownership, no subscriptions)
- Hands-on curriculum: Prompt Lab, Tool Builder Studio, RAG Explorer, Model Lab, MCP Server Studio

TECHNICAL INFRASTRUCTURE:
- 2x NVIDIA DGX Spark ($10K) for fine-tuning models up to 405B parameters
- 3x Mac Studio M3 Ultra ($35K) for inference via Ollama
- Workflow: DGX Spark fine-tuning -> GGUF export -> Ollama deployment -> Family access
- Take-home kits (details in development)

TEAM:
- Program Director ($35K)
- ML Technical Lead ($45K)
- 4 community college education/childcare majors + 2 TAMS HS students ($20K total)

TARGET POPULATION:
- 21.7% of Black youth in Baltimore are Opportunity Youth
- 40.7% of Baltimore households lack broadband
- 58.3% of Baltimore graduates need college remediation
- Addressing the digital divide and AI skills gap

Answer questions clearly and concisely. If you don't know something specific, be honest. \
Focus on the producer-first approach and family learning model that makes this program unique.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One `{role, content}` turn as sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// What the chat window shows, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TranscriptEntry {
    User(String),
    Assistant(String),
    /// Transient placeholder while a request is in flight.
    Typing,
    /// Inline failure notice; the user's turn stays in history.
    Error(String),
}

/// A request produced by [`ChatSession::begin`], ready for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    system_prompt: String,
    history: Vec<ChatMessage>,
    transcript: Vec<TranscriptEntry>,
    busy: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl ChatSession {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            transcript: Vec::new(),
            busy: false,
        }
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    #[must_use]
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Number of user turns so far (the footer counter).
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.history
            .iter()
            .filter(|message| message.role == Role::User)
            .count()
    }

    /// Record a user message and build its request.
    ///
    /// Returns `None`, changing nothing, when the trimmed text is empty or a
    /// request is already in flight.
    pub fn begin(&mut self, text: &str) -> Option<PendingRequest> {
        let text = text.trim();
        if text.is_empty() || self.busy {
            debug!(busy = self.busy, "chat send ignored");
            return None;
        }

        let context_start = self.history.len().saturating_sub(CONTEXT_TURNS);
        let mut messages = Vec::with_capacity(self.history.len() - context_start + 2);
        messages.push(ChatMessage::new(Role::System, self.system_prompt.clone()));
        messages.extend(self.history[context_start..].iter().cloned());
        messages.push(ChatMessage::new(Role::User, text));

        self.history.push(ChatMessage::new(Role::User, text));
        self.transcript.push(TranscriptEntry::User(text.to_string()));
        self.transcript.push(TranscriptEntry::Typing);
        self.busy = true;

        Some(PendingRequest { messages })
    }

    /// Settle the in-flight request with the backend's result.
    ///
    /// Returns the entry that replaced the typing placeholder, or `None` if
    /// nothing was in flight.
    pub fn finish(&mut self, result: Result<String, ChatError>) -> Option<&TranscriptEntry> {
        if !self.busy {
            return None;
        }
        self.busy = false;
        if let Some(pos) = self
            .transcript
            .iter()
            .rposition(|entry| *entry == TranscriptEntry::Typing)
        {
            self.transcript.remove(pos);
        }

        let entry = match result {
            Ok(reply) => {
                self.history
                    .push(ChatMessage::new(Role::Assistant, reply.clone()));
                TranscriptEntry::Assistant(reply)
            }
            Err(err) => {
                debug!(code = %err.code(), error = %err, "chat turn failed");
                TranscriptEntry::Error(err.to_string())
            }
        };
        self.transcript.push(entry);
        self.transcript.last()
    }

    /// Run one full turn against `backend`.
    pub fn send(
        &mut self,
        text: &str,
        backend: &dyn CompletionBackend,
    ) -> Option<&TranscriptEntry> {
        let request = self.begin(text)?;
        let result = backend.complete(&request.messages);
        self.finish(result)
    }
}
