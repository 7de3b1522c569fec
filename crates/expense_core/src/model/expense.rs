//! Expense domain model.
//!
//! # Responsibility
//! - Define the canonical expense record shared by store, analyzer and shell.
//! - Own the field-level validation rules used before any write.
//!
//! # Invariants
//! - `amount` is finite and strictly positive.
//! - `name` and `category` are non-empty after trimming whitespace.
//! - `id` is `None` until the store assigns one; it never changes afterwards.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned row identifier.
pub type ExpenseId = i64;

/// Date format used for the persisted `expenses.date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date of an expense, when one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ExpenseDate {
    /// Expense has a known calendar date (no time-of-day).
    Dated(NaiveDate),
    /// No date recorded; rows from the minimal schema variant read back this way.
    #[default]
    Undated,
}

impl ExpenseDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Dated(date) => Some(*date),
            Self::Undated => None,
        }
    }

    /// Resolves an undated value to today's local date.
    pub fn or_today(self) -> NaiveDate {
        self.as_date()
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn to_db_text(&self) -> Option<String> {
        self.as_date()
            .map(|date| date.format(DATE_FORMAT).to_string())
    }

    /// Parses the nullable `date` column back into the model.
    pub fn parse_db_text(value: Option<&str>) -> Result<Self, chrono::ParseError> {
        match value {
            Some(text) => Ok(Self::Dated(NaiveDate::parse_from_str(
                text.trim(),
                DATE_FORMAT,
            )?)),
            None => Ok(Self::Undated),
        }
    }
}

impl Display for ExpenseDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dated(date) => f.pad(&date.format(DATE_FORMAT).to_string()),
            Self::Undated => f.pad("unknown"),
        }
    }
}

/// Canonical expense record.
///
/// Instances held outside the store are disposable projections; the store
/// owns the durable copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// `None` for unsaved candidates, `Some` once persisted.
    pub id: Option<ExpenseId>,
    /// Vendor or free-form description.
    pub name: String,
    /// Currency-agnostic positive amount.
    pub amount: f64,
    /// Free-form label such as `Groceries` or `Dining`.
    pub category: String,
    pub date: ExpenseDate,
}

/// Validation failures for expense input.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseValidationError {
    EmptyName,
    EmptyCategory,
    /// Amount is zero, negative, NaN or infinite.
    NonPositiveAmount(f64),
    /// Manually typed amount is not a decimal number.
    InvalidAmountText(String),
}

impl Display for ExpenseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "expense name cannot be empty"),
            Self::EmptyCategory => write!(f, "expense category cannot be empty"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "expense amount must be a positive number, got {amount}")
            }
            Self::InvalidAmountText(text) => {
                write!(f, "expense amount `{text}` is not a valid number")
            }
        }
    }
}

impl Error for ExpenseValidationError {}

impl Expense {
    /// Creates an unsaved, undated expense.
    ///
    /// Does not validate; call [`Expense::validate`] or go through the store.
    pub fn new(name: impl Into<String>, amount: f64, category: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            amount,
            category: category.into(),
            date: ExpenseDate::Undated,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = ExpenseDate::Dated(date);
        self
    }

    /// Builds a validated expense from raw form input.
    ///
    /// # Errors
    /// - `EmptyName` / `EmptyCategory` when a field is blank.
    /// - `InvalidAmountText` when `amount_text` is not a plain decimal.
    /// - `NonPositiveAmount` when the parsed amount is not strictly positive.
    pub fn from_manual_input(
        name: &str,
        amount_text: &str,
        category: &str,
    ) -> Result<Self, ExpenseValidationError> {
        let trimmed_amount = amount_text.trim();
        let amount = trimmed_amount
            .parse::<f64>()
            .map_err(|_| ExpenseValidationError::InvalidAmountText(trimmed_amount.to_string()))?;

        let expense = Self::new(name.trim(), amount, category.trim());
        expense.validate()?;
        Ok(expense)
    }

    /// Checks record invariants without touching storage.
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.name.trim().is_empty() {
            return Err(ExpenseValidationError::EmptyName);
        }
        if self.category.trim().is_empty() {
            return Err(ExpenseValidationError::EmptyCategory);
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ExpenseValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Expense, ExpenseDate, ExpenseValidationError};
    use chrono::NaiveDate;

    #[test]
    fn validate_rejects_blank_fields_and_bad_amounts() {
        assert_eq!(
            Expense::new("  ", 1.0, "Food").validate(),
            Err(ExpenseValidationError::EmptyName)
        );
        assert_eq!(
            Expense::new("Cafe", 1.0, "\t").validate(),
            Err(ExpenseValidationError::EmptyCategory)
        );
        assert!(matches!(
            Expense::new("Cafe", 0.0, "Food").validate(),
            Err(ExpenseValidationError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            Expense::new("Cafe", f64::NAN, "Food").validate(),
            Err(ExpenseValidationError::NonPositiveAmount(_))
        ));
        assert!(Expense::new("Cafe", 0.01, "Food").validate().is_ok());
    }

    #[test]
    fn db_text_roundtrip_keeps_calendar_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let text = ExpenseDate::Dated(date).to_db_text().unwrap();
        assert_eq!(text, "2024-02-29");
        assert_eq!(
            ExpenseDate::parse_db_text(Some(&text)).unwrap(),
            ExpenseDate::Dated(date)
        );
        assert_eq!(
            ExpenseDate::parse_db_text(None).unwrap(),
            ExpenseDate::Undated
        );
        assert!(ExpenseDate::parse_db_text(Some("29/02/2024")).is_err());
    }

    #[test]
    fn undated_displays_as_unknown() {
        assert_eq!(ExpenseDate::Undated.to_string(), "unknown");
        assert_eq!(ExpenseDate::Undated.to_db_text(), None);
    }

    #[test]
    fn display_honors_column_width() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(format!("{:<10}|", ExpenseDate::Undated), "unknown   |");
        assert_eq!(format!("{:<12}|", ExpenseDate::Dated(date)), "2024-05-01  |");
    }
}
