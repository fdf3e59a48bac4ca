//! Completion backends: the trait the session talks to, and the blocking
//! HTTP client for OpenAI-compatible `chat/completions` endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::ChatMessage;
use crate::config::ChatConfig;
use crate::error::ErrorCode;

/// Marker that identifies an unedited example key.
pub const PLACEHOLDER_KEY_MARKER: &str = "your-api-key-here";

/// Why a chat turn produced no reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("API key not configured")]
    MissingCredential,

    #[error("{0}")]
    Transport(String),

    /// Non-success status; `message` is the remote `error.message` when the
    /// body carried one.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    BadResponse(String),
}

impl ChatError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCredential => ErrorCode::ChatCredentialMissing,
            Self::Transport(_) | Self::Status { .. } | Self::BadResponse(_) => {
                ErrorCode::ChatRequestFailed
            }
        }
    }
}

/// Anything that can turn a message list into one assistant reply.
pub trait CompletionBackend {
    /// Run one completion over `messages` (system prompt first).
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] describing why no reply was produced.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Blocking `ureq` client. One POST per call, no retries, no timeout.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    config: ChatConfig,
    api_key: Option<String>,
}

impl HttpCompletionClient {
    /// Build a client; `api_key` is sent as a bearer token when present.
    #[must_use]
    pub fn new(config: ChatConfig, api_key: Option<String>) -> Self {
        Self {
            config,
            api_key: api_key.filter(|key| usable_key(key)),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl CompletionBackend for HttpCompletionClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        if self.config.require_key && self.api_key.is_none() {
            return Err(ChatError::MissingCredential);
        }

        let body = CompletionBody {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut request = ureq::post(&self.config.endpoint)
            .set("Content-Type", "application/json")
            .set("User-Agent", concat!("grant-tracker/", env!("CARGO_PKG_VERSION")));
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            messages = messages.len(),
            "sending chat completion"
        );

        let response = match request.send_json(&body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let envelope: ErrorEnvelope = response.into_json().unwrap_or_default();
                let message = envelope
                    .error
                    .and_then(|detail| detail.message)
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| "API request failed".to_string());
                warn!(status, %message, "chat completion rejected");
                return Err(ChatError::Status { status, message });
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(error = %transport, "chat completion transport failure");
                return Err(ChatError::Transport(transport.to_string()));
            }
        };

        let parsed: CompletionResponse = response
            .into_json()
            .map_err(|err| ChatError::BadResponse(err.to_string()))?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatError::BadResponse("no choices in completion".to_string()))?;

        debug!(chars = reply.len(), "chat completion received");
        Ok(reply)
    }
}

/// Blank keys and unedited example keys count as missing.
#[must_use]
pub fn usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.contains(PLACEHOLDER_KEY_MARKER)
}
