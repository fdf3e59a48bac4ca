use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Machine-readable error codes for scripts and agents driving the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    StorageWriteFailed,
    LockContention,
    TaskNotFound,
    BudgetLineNotFound,
    AmbiguousId,
    InvalidField,
    InvalidEnumValue,
    ImportInvalid,
    ChatCredentialMissing,
    ChatRequestFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::StorageWriteFailed => "E1002",
            Self::LockContention => "E1003",
            Self::TaskNotFound => "E2001",
            Self::BudgetLineNotFound => "E2002",
            Self::AmbiguousId => "E2003",
            Self::InvalidField => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::ImportInvalid => "E3001",
            Self::ChatCredentialMissing => "E4001",
            Self::ChatRequestFailed => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::StorageWriteFailed => "Tracker file write failed",
            Self::LockContention => "Lock contention",
            Self::TaskNotFound => "Task not found",
            Self::BudgetLineNotFound => "Budget line not found",
            Self::AmbiguousId => "Ambiguous row ID",
            Self::InvalidField => "Invalid field value",
            Self::InvalidEnumValue => "Invalid status/category/priority value",
            Self::ImportInvalid => "Import file rejected",
            Self::ChatCredentialMissing => "Chat credential not configured",
            Self::ChatRequestFailed => "Chat request failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix syntax in grant-tracker/config.toml (see `grant config`) and retry.")
            }
            Self::StorageWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `grant` process finishes."),
            Self::TaskNotFound => Some("Run `grant task list` to see task IDs."),
            Self::BudgetLineNotFound => Some("Run `grant budget list` to see budget line IDs."),
            Self::AmbiguousId => Some("Use a longer ID prefix to disambiguate."),
            Self::InvalidField => None,
            Self::InvalidEnumValue => {
                Some("Use one of the documented status/category/priority values.")
            }
            Self::ImportInvalid => Some("Please check the file format and retry."),
            Self::ChatCredentialMissing => Some(
                "Set GRANT_CHAT_API_KEY, or point chat.endpoint at a proxy with require_key = false.",
            ),
            Self::ChatRequestFailed => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by store, import, and chat operations.
#[derive(Debug, Error)]
pub enum GrantError {
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    #[error("budget line not found: {id}")]
    BudgetLineNotFound { id: String },

    #[error("ambiguous ID '{prefix}': matches {count} rows")]
    AmbiguousId { prefix: String, count: usize },

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    InvalidEnum(#[from] crate::model::ParseEnumError),

    #[error("import failed: {reason}")]
    ImportInvalid { reason: String },

    #[error("failed to write {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lock(#[from] crate::lock::LockError),

    #[error(transparent)]
    Chat(#[from] crate::chat::ChatError),

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GrantError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::BudgetLineNotFound { .. } => ErrorCode::BudgetLineNotFound,
            Self::AmbiguousId { .. } => ErrorCode::AmbiguousId,
            Self::InvalidField { .. } => ErrorCode::InvalidField,
            Self::InvalidEnum(_) => ErrorCode::InvalidEnumValue,
            Self::ImportInvalid { .. } => ErrorCode::ImportInvalid,
            Self::StorageWrite { .. } => ErrorCode::StorageWriteFailed,
            Self::Lock(err) => err.code(),
            Self::Chat(err) => err.code(),
            Self::Serialize(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Remediation hint, falling back to the generic message for the code.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.code();
        code.hint().unwrap_or(code.message()).to_string()
    }

    /// Shorthand for [`GrantError::InvalidField`].
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
