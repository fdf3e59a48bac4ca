use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, RowId, normalize};
use crate::error::GrantError;

/// Whether a budget line's funding is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FundingStatus {
    Secured,
    #[default]
    Pending,
}

impl FundingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secured => "secured",
            Self::Pending => "pending",
        }
    }

    /// Capitalized label for tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Secured => "Secured",
            Self::Pending => "Pending",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Secured => Self::Pending,
            Self::Pending => Self::Secured,
        }
    }
}

impl fmt::Display for FundingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "secured" => Ok(Self::Secured),
            "pending" => Ok(Self::Pending),
            _ => Err(ParseEnumError {
                expected: "funding status",
                got: s.to_string(),
            }),
        }
    }
}

/// One budget line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    #[serde(default)]
    pub id: RowId,
    pub item: String,
    pub amount: f64,
    #[serde(default)]
    pub status: FundingStatus,
    #[serde(default)]
    pub notes: String,
}

impl BudgetLine {
    #[must_use]
    pub fn is_secured(&self) -> bool {
        self.status == FundingStatus::Secured
    }

    pub(crate) fn validate(&self) -> Result<(), GrantError> {
        if self.item.trim().is_empty() {
            return Err(GrantError::invalid("item", "must not be empty"));
        }
        validate_amount(self.amount)
    }
}

fn validate_amount(amount: f64) -> Result<(), GrantError> {
    if !amount.is_finite() {
        return Err(GrantError::invalid("amount", "must be a finite number"));
    }
    if amount < 0.0 {
        return Err(GrantError::invalid("amount", "must not be negative"));
    }
    Ok(())
}

/// Fields collected by the "add budget line" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetDraft {
    pub item: String,
    pub amount: f64,
    pub status: FundingStatus,
    pub notes: String,
}

impl BudgetDraft {
    #[must_use]
    pub fn new(item: impl Into<String>, amount: f64) -> Self {
        Self {
            item: item.into(),
            amount,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: FundingStatus) -> Self {
        self.status = status;
        self
    }

    /// Trim and validate, producing the line that would be stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::InvalidField`] for a blank item or a negative or
    /// non-finite amount.
    pub fn into_line(self, id: RowId) -> Result<BudgetLine, GrantError> {
        let line = BudgetLine {
            id,
            item: self.item.trim().to_string(),
            amount: self.amount,
            status: self.status,
            notes: self.notes.trim().to_string(),
        };
        line.validate()?;
        Ok(line)
    }
}

/// A structured budget-line edit, validated as a whole before it applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<FundingStatus>,
    pub notes: Option<String>,
}

impl BudgetPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the edited line without touching `line`.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::InvalidField`] if the result would be invalid.
    pub fn applied_to(&self, line: &BudgetLine) -> Result<BudgetLine, GrantError> {
        let mut next = line.clone();
        if let Some(item) = &self.item {
            next.item = item.trim().to_string();
        }
        if let Some(amount) = self.amount {
            next.amount = amount;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(notes) = &self.notes {
            next.notes = notes.trim().to_string();
        }
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FundingStatus::Secured).unwrap(),
            "\"secured\""
        );
        assert_eq!(
            serde_json::from_str::<FundingStatus>("\"pending\"").unwrap(),
            FundingStatus::Pending
        );
    }

    #[test]
    fn toggle_flips_both_ways() {
        assert_eq!(FundingStatus::Secured.toggled(), FundingStatus::Pending);
        assert_eq!(FundingStatus::Pending.toggled(), FundingStatus::Secured);
    }

    #[test]
    fn draft_validation() {
        let id = || RowId::new_unchecked("b-0000");
        assert!(BudgetDraft::new("Laptops", 1200.0).into_line(id()).is_ok());
        assert!(BudgetDraft::new("  ", 10.0).into_line(id()).is_err());
        assert!(BudgetDraft::new("Venue", f64::NAN).into_line(id()).is_err());
        assert!(BudgetDraft::new("Venue", f64::INFINITY).into_line(id()).is_err());
        assert!(BudgetDraft::new("Refund", -5.0).into_line(id()).is_err());
        assert!(BudgetDraft::new("In-kind", 0.0).into_line(id()).is_ok());
    }

    #[test]
    fn rejected_patch_leaves_line_alone() {
        let line = BudgetDraft::new("Stipends", 20_000.0)
            .into_line(RowId::new_unchecked("b-0001"))
            .unwrap();
        let patch = BudgetPatch {
            amount: Some(f64::NAN),
            notes: Some("revised".into()),
            ..BudgetPatch::default()
        };
        assert!(patch.applied_to(&line).is_err());
        assert_eq!(line.notes, "");
        assert!((line.amount - 20_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn legacy_line_parses_without_id() {
        let raw = r#"{"item":"Mac Studio","amount":35000,"status":"secured","notes":""}"#;
        let line: BudgetLine = serde_json::from_str(raw).unwrap();
        assert!(line.id.is_empty());
        assert!(line.is_secured());
    }
}
