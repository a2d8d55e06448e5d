//! Operation model
//!
//! An operation is a single income or expense booked against an account.
//! The stored amount is always positive; the sign comes from the type.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::CategoryType;
use super::date_range::DateRange;
use super::ids::{AccountId, CategoryId, OperationId};
use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Operations share the income/expense split with categories
pub type OperationType = CategoryType;

/// How often a recurring operation repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    /// Parse a pattern from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" | "annual" | "annually" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// The occurrence following `date`
    pub fn next_after(&self, date: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.nth_after(date, 1)
    }

    /// The `n`-th occurrence counted from `start`
    ///
    /// Month arithmetic always starts from `start`, so a series beginning on
    /// the 31st clamps in short months and returns to the 31st afterwards.
    pub fn nth_after(&self, start: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => start.checked_add_signed(Duration::days(i64::from(n))),
            Self::Weekly => start.checked_add_signed(Duration::weeks(i64::from(n))),
            Self::Monthly => start.checked_add_months(Months::new(n)),
            Self::Yearly => start.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

/// A booked income or expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,

    #[serde(rename = "type")]
    pub operation_type: OperationType,

    pub account_id: AccountId,

    /// Always strictly positive
    pub amount: Money,

    /// When the operation took effect
    pub date: DateTime<Utc>,

    pub category_id: CategoryId,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurrencePattern>,

    /// Date of the last occurrence generated from this template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_occurrence: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Operation {
    /// Create a new operation
    pub fn new(
        operation_type: OperationType,
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OperationId::new(),
            operation_type,
            account_id,
            amount,
            date,
            category_id,
            description: description.into(),
            is_recurring: false,
            recurring_pattern: None,
            last_occurrence: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_income(&self) -> bool {
        self.operation_type == OperationType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.operation_type == OperationType::Expense
    }

    /// Amount with the sign implied by the type (expenses negative)
    pub fn signed_amount(&self) -> Money {
        match self.operation_type {
            OperationType::Income => self.amount.clone(),
            OperationType::Expense => self.amount.negate(),
        }
    }

    pub fn is_in_range(&self, range: &DateRange) -> bool {
        range.contains(self.date)
    }

    /// A one-off copy of this operation dated `date`
    pub fn clone_for_date(&self, date: DateTime<Utc>) -> Operation {
        let mut copy = Operation::new(
            self.operation_type,
            self.account_id,
            self.amount.clone(),
            self.category_id,
            format!("{} (Recurring)", self.description),
            date,
        );
        if copy.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            copy.description = copy.description.chars().take(MAX_DESCRIPTION_LENGTH).collect();
        }
        copy
    }

    /// Change the amount; must stay positive and in the same currency
    pub fn set_amount(&mut self, amount: Money) -> LedgerResult<()> {
        if !amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "Operation amount must be positive, got {}",
                amount
            )));
        }
        if !amount.same_currency(&self.amount) {
            return Err(LedgerError::Validation(format!(
                "Operation is in {}, cannot change amount to {}",
                self.amount.currency(),
                amount
            )));
        }
        self.amount = amount;
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> LedgerResult<()> {
        let description = description.into();
        validate_description(&description)?;
        self.description = description;
        self.touch();
        Ok(())
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
        self.touch();
    }

    pub fn set_category(&mut self, category_id: CategoryId) {
        self.category_id = category_id;
        self.touch();
    }

    /// Mark this operation as a recurring template, or clear the mark
    pub fn set_recurring(&mut self, pattern: Option<RecurrencePattern>) {
        self.is_recurring = pattern.is_some();
        self.recurring_pattern = pattern;
        self.last_occurrence = None;
        self.touch();
    }

    /// Dates of the occurrences due up to and including `as_of`
    pub fn due_occurrences(&self, as_of: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let Some(pattern) = self.recurring_pattern.filter(|_| self.is_recurring) else {
            return Vec::new();
        };

        let mut due = Vec::new();
        for n in 1u32.. {
            let Some(next) = pattern.nth_after(self.date, n) else {
                break;
            };
            if next > as_of {
                break;
            }
            if self.last_occurrence.map_or(true, |last| next > last) {
                due.push(next);
            }
        }
        due
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.operation_type,
            self.signed_amount()
        )
    }
}

pub(crate) fn validate_description(description: &str) -> LedgerResult<()> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(LedgerError::Validation(format!(
            "Description too long ({} chars, max {})",
            len, MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}
