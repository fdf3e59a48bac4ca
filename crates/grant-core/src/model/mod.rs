//! Tracker document model: meta, tasks, budget lines, notes.
//!
//! The serialized shape is the one the tracker has always exported, so files
//! produced by older versions (which lack row IDs) still import cleanly; rows
//! without an ID get one assigned on load.

pub mod budget;
pub mod document;
pub mod id;
pub mod task;

pub use budget::{BudgetDraft, BudgetLine, BudgetPatch, FundingStatus};
pub use document::{Document, Meta};
pub use id::{RowId, RowKind};
pub use task::{Category, Priority, Task, TaskDraft, TaskPatch, TaskStatus};

use std::fmt;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

// Labels serialize as their display text. Deserialization goes through
// `FromStr`, so any spelling the CLI accepts (`done`, `p1`, `in-progress`)
// also loads from a stored or imported file. Blank loads as the default.
macro_rules! label_serde {
    ($($ty:ty),+ $(,)?) => {$(
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                if raw.trim().is_empty() {
                    return Ok(Self::default());
                }
                raw.parse::<Self>().map_err(serde::de::Error::custom)
            }
        }
    )+};
}

label_serde!(TaskStatus, Category, Priority, FundingStatus);

/// Lowercase, trim, and fold `-`/`_` into spaces so `in-progress` parses.
pub(crate) fn normalize(input: &str) -> String {
    input
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect()
}

/// Serde adapter for "date or empty string" fields (`due`, `deadline`).
pub(crate) mod date_or_empty {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, FORMAT)
                .map(Some)
                .map_err(|err| serde::de::Error::custom(format!("invalid date '{text}': {err}"))),
        }
    }
}

/// Parse a user-entered date (`YYYY-MM-DD`); blank input clears the date.
///
/// # Errors
///
/// Returns [`crate::error::GrantError::InvalidField`] for anything that is not
/// blank or a valid calendar date.
pub fn parse_date_input(
    field: &'static str,
    raw: &str,
) -> Result<Option<chrono::NaiveDate>, crate::error::GrantError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    chrono::NaiveDate::parse_from_str(trimmed, date_or_empty::FORMAT)
        .map(Some)
        .map_err(|_| {
            crate::error::GrantError::invalid(field, format!("'{trimmed}' is not a YYYY-MM-DD date"))
        })
}
