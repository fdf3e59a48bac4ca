//! JSON export and import of the whole tracker document.

use serde_json::Value;
use tracing::debug;

use crate::error::GrantError;
use crate::model::Document;

/// File stem used when the grant has no name.
pub const DEFAULT_EXPORT_STEM: &str = "grant-tracker";

const TOP_LEVEL_FIELDS: [&str; 4] = ["meta", "tasks", "budget", "notes"];

/// Pretty-printed JSON of the full document.
///
/// # Errors
///
/// Returns [`GrantError::Serialize`] if serialization fails.
pub fn export_json(doc: &Document) -> Result<String, GrantError> {
    let mut out = serde_json::to_string_pretty(doc)?;
    out.push('\n');
    Ok(out)
}

/// `<slug>.json` for the grant name.
#[must_use]
pub fn export_file_name(grant_name: &str) -> String {
    format!("{}.json", file_slug(grant_name))
}

/// File stem for exports and reports: the grant name lowercased, each run of
/// characters outside `[a-z0-9]` replaced by a single `-`.
#[must_use]
pub fn file_slug(grant_name: &str) -> String {
    let source = if grant_name.is_empty() {
        DEFAULT_EXPORT_STEM
    } else {
        grant_name
    };

    let mut slug = String::with_capacity(source.len());
    let mut in_gap = false;
    for ch in source.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    slug
}

/// Parse an exported file into a document, or reject it whole.
///
/// Missing (or `null`) top-level fields default to empty; unknown fields are
/// ignored. Rows must satisfy the same invariants as rows entered by hand.
///
/// # Errors
///
/// Returns [`GrantError::ImportInvalid`] when the text is not JSON, the root
/// is not an object, or any field or row is malformed.
pub fn parse_import(raw: &str) -> Result<Document, GrantError> {
    let mut value: Value = serde_json::from_str(raw).map_err(|err| GrantError::ImportInvalid {
        reason: format!("not valid JSON: {err}"),
    })?;

    let Some(root) = value.as_object_mut() else {
        return Err(GrantError::ImportInvalid {
            reason: "top-level value must be an object".to_string(),
        });
    };
    for field in TOP_LEVEL_FIELDS {
        if root.get(field).is_some_and(Value::is_null) {
            root.remove(field);
        }
    }

    let doc: Document = serde_json::from_value(value).map_err(|err| GrantError::ImportInvalid {
        reason: err.to_string(),
    })?;
    doc.validate().map_err(|err| GrantError::ImportInvalid {
        reason: err.to_string(),
    })?;

    debug!(
        tasks = doc.tasks.len(),
        budget = doc.budget.len(),
        "import parsed"
    );
    Ok(doc)
}
