//! Budget table and totals.

use serde::Serialize;

use crate::model::{BudgetLine, FundingStatus, RowId};

/// Total requested, how much is secured, and the remaining gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BudgetTotals {
    pub total: f64,
    pub secured: f64,
    pub gap: f64,
}

impl BudgetTotals {
    #[must_use]
    pub fn of(lines: &[BudgetLine]) -> Self {
        let total: f64 = lines.iter().map(|line| line.amount).sum();
        let secured: f64 = lines
            .iter()
            .filter(|line| line.is_secured())
            .map(|line| line.amount)
            .sum();
        Self {
            total,
            secured,
            gap: total - secured,
        }
    }
}

/// One rendered budget row, with its amount pre-formatted for tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRow {
    pub id: RowId,
    pub item: String,
    pub amount: f64,
    pub amount_display: String,
    pub status: FundingStatus,
    pub notes: String,
}

/// Budget rows in insertion order.
#[must_use]
pub fn budget_rows(lines: &[BudgetLine]) -> Vec<BudgetRow> {
    lines
        .iter()
        .map(|line| BudgetRow {
            id: line.id.clone(),
            item: line.item.clone(),
            amount: line.amount,
            amount_display: fmt_money(line.amount),
            status: line.status,
            notes: line.notes.clone(),
        })
        .collect()
}

/// US-dollar display: `$150`, `$1,234.50`. Cents appear only when the
/// amount (rounded to the cent) is not whole.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn fmt_money(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0".to_string();
    }

    let cents = (amount * 100.0).round() as i128;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = group_thousands(cents / 100);
    let frac = cents % 100;

    if frac == 0 {
        format!("{sign}${whole}")
    } else {
        format!("{sign}${whole}.{frac:02}")
    }
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
