//! Money type for representing currency amounts
//!
//! Amounts are stored as `rust_decimal::Decimal` tagged with a short currency
//! code. Arithmetic and comparison between different currencies is refused
//! with a validation error; there is no conversion.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};

/// Currency used when none is given
pub const DEFAULT_CURRENCY: &str = "RUB";

/// Amounts closer than this are considered equal
const EPSILON: Decimal = dec!(0.001);

/// A monetary amount in a single currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Create a Money amount, validating the currency code
    ///
    /// # Examples
    /// ```
    /// use ledger::models::Money;
    /// use rust_decimal_macros::dec;
    /// let amount = Money::new(dec!(10.50), "usd").unwrap();
    /// assert_eq!(amount.to_string(), "10.50 USD");
    /// ```
    pub fn new(amount: Decimal, currency: &str) -> LedgerResult<Self> {
        Ok(Self {
            amount,
            currency: normalize_currency(currency)?,
        })
    }

    /// Create a zero amount in the given currency
    pub fn zero(currency: &str) -> LedgerResult<Self> {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parse a decimal string like "1000", "12.5" or "-3.75"
    pub fn parse(text: &str, currency: &str) -> LedgerResult<Self> {
        let cleaned: String = text.trim().chars().filter(|c| *c != '_' && *c != ',').collect();
        let amount = Decimal::from_str(&cleaned)
            .map_err(|e| LedgerError::Validation(format!("Invalid amount '{}': {}", text, e)))?;
        Self::new(amount, currency)
    }

    /// The raw decimal amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency code
    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.abs() < EPSILON
    }

    pub fn is_positive(&self) -> bool {
        self.amount > EPSILON
    }

    pub fn is_negative(&self) -> bool {
        self.amount < -EPSILON
    }

    /// Check whether both amounts carry the same currency
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Add two amounts of the same currency
    ///
    /// A sum outside the decimal range is a validation error.
    pub fn checked_add(&self, other: &Money) -> LedgerResult<Money> {
        self.ensure_same_currency(other, "add")?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| overflow("+", self, other))?;
        Ok(self.with_amount(amount))
    }

    /// Subtract an amount of the same currency
    pub fn checked_sub(&self, other: &Money) -> LedgerResult<Money> {
        self.ensure_same_currency(other, "subtract")?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| overflow("-", self, other))?;
        Ok(self.with_amount(amount))
    }

    /// Compare two amounts of the same currency, within tolerance
    pub fn try_cmp(&self, other: &Money) -> LedgerResult<Ordering> {
        self.ensure_same_currency(other, "compare")?;
        Ok(match self.amount.checked_sub(other.amount) {
            Some(diff) if diff.abs() < EPSILON => Ordering::Equal,
            _ => self.amount.cmp(&other.amount),
        })
    }

    /// Scale the amount by a factor, keeping the currency
    pub fn multiply(&self, factor: Decimal) -> LedgerResult<Money> {
        let amount = self.amount.checked_mul(factor).ok_or_else(|| {
            LedgerError::Validation(format!("Amount overflow: {} * {}", self, factor))
        })?;
        Ok(self.with_amount(amount))
    }

    /// Split the amount into `divisor` equal parts, keeping the currency
    pub fn divide(&self, divisor: Decimal) -> LedgerResult<Money> {
        let amount = self.amount.checked_div(divisor).ok_or_else(|| {
            LedgerError::Validation(format!("Cannot divide {} by {}", self, divisor))
        })?;
        Ok(self.with_amount(amount))
    }

    pub fn negate(&self) -> Money {
        self.with_amount(-self.amount)
    }

    pub fn abs(&self) -> Money {
        self.with_amount(self.amount.abs())
    }

    /// Sum amounts starting from zero in `currency`
    pub fn sum<'a>(currency: &str, amounts: impl IntoIterator<Item = &'a Money>) -> LedgerResult<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency)?, |total, amount| total.checked_add(amount))
    }

    fn with_amount(&self, amount: Decimal) -> Money {
        Money {
            amount,
            currency: self.currency.clone(),
        }
    }

    fn ensure_same_currency(&self, other: &Money, action: &str) -> LedgerResult<()> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(LedgerError::Validation(format!(
                "Cannot {} amounts in different currencies: {} and {}",
                action, self.currency, other.currency
            )))
        }
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency
            && self
                .amount
                .checked_sub(other.amount)
                .map_or(false, |diff| diff.abs() < EPSILON)
    }
}

fn overflow(op: &str, left: &Money, right: &Money) -> LedgerError {
    LedgerError::Validation(format!(
        "Amount overflow: {} {} {}",
        left.amount, op, right.amount
    ))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount.round_dp(2), self.currency)
    }
}

fn normalize_currency(code: &str) -> LedgerResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(LedgerError::Validation("Currency code cannot be empty".into()));
    }
    if code.chars().count() > 3 {
        return Err(LedgerError::Validation(format!(
            "Currency code '{}' is longer than 3 characters",
            code
        )));
    }
    Ok(code.to_uppercase())
}
