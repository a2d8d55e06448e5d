//! Account model
//!
//! A bank account holding a single-currency balance. Balance changes go
//! through `deposit`, `withdraw`, `transfer` and `recalculate_balance`, each
//! of which enforces the account's invariants before mutating anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ids::AccountId;
use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

/// Maximum length of an account name
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of an account number
pub const MAX_ACCOUNT_NUMBER_LENGTH: usize = 20;

/// A bank account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Main card")
    pub name: String,

    /// Current balance; its currency never changes
    pub balance: Money,

    /// External account number, may be empty
    #[serde(default)]
    pub account_number: String,

    /// Inactive accounts refuse deposits and withdrawals
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account with the given opening balance
    pub fn new(name: impl Into<String>, balance: Money, account_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            balance,
            account_number: account_number.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Currency of this account
    pub fn currency(&self) -> &str {
        self.balance.currency()
    }

    /// Add money to the account
    pub fn deposit(&mut self, amount: &Money) -> LedgerResult<()> {
        self.ensure_active("deposit to")?;
        self.ensure_movable(amount)?;

        self.balance = self.balance.checked_add(amount)?;
        self.touch();
        Ok(())
    }

    /// Take money out of the account
    pub fn withdraw(&mut self, amount: &Money) -> LedgerResult<()> {
        self.ensure_active("withdraw from")?;
        self.ensure_movable(amount)?;

        if !self.can_withdraw(amount)? {
            return Err(self.insufficient_funds(amount));
        }

        self.balance = self.balance.checked_sub(amount)?;
        self.touch();
        Ok(())
    }

    /// Check whether the balance covers `amount`
    pub fn can_withdraw(&self, amount: &Money) -> LedgerResult<bool> {
        Ok(self.balance.try_cmp(amount)? != Ordering::Less)
    }

    /// Move `amount` from this account into `target`
    ///
    /// The withdrawal happens first. If the deposit into `target` is refused
    /// the withdrawn amount is put back before the deposit error is returned,
    /// so on failure both balances are exactly what they were.
    pub fn transfer(&mut self, target: &mut Account, amount: &Money) -> LedgerResult<()> {
        if self.id == target.id {
            return Err(LedgerError::DomainRule(
                "Cannot transfer to the same account".into(),
            ));
        }

        let before = self.balance.clone();
        let touched = self.updated_at;
        self.withdraw(amount)?;

        if let Err(e) = target.deposit(amount) {
            self.balance = before;
            self.updated_at = touched;
            return Err(e);
        }

        Ok(())
    }

    /// Overwrite the balance, e.g. after reconciliation
    pub fn recalculate_balance(&mut self, new_balance: Money) -> LedgerResult<()> {
        if !self.balance.same_currency(&new_balance) {
            return Err(LedgerError::Validation(format!(
                "Cannot set a {} balance on a {} account",
                new_balance.currency(),
                self.currency()
            )));
        }
        self.balance = new_balance;
        self.touch();
        Ok(())
    }

    /// Reverse a previously applied signed change to the balance
    ///
    /// Used when undoing work on this account. Unlike `deposit`/`withdraw`
    /// this ignores the active flag, but it never lets the balance go below
    /// zero.
    pub fn revert(&mut self, applied: &Money) -> LedgerResult<()> {
        let reverted = self.balance.checked_sub(applied)?;
        if reverted.is_negative() {
            return Err(self.insufficient_funds(applied));
        }
        self.balance = reverted;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Rename the account
    pub fn rename(&mut self, name: impl Into<String>) -> LedgerResult<()> {
        let name = name.into();
        validate_name(&name).map_err(|e| LedgerError::Validation(e.to_string()))?;
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Change the external account number
    pub fn set_account_number(&mut self, number: impl Into<String>) -> LedgerResult<()> {
        let number = number.into();
        validate_account_number(&number).map_err(|e| LedgerError::Validation(e.to_string()))?;
        self.account_number = number;
        self.touch();
        Ok(())
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        validate_name(&self.name)?;
        validate_account_number(&self.account_number)
    }

    fn ensure_active(&self, action: &str) -> LedgerResult<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(LedgerError::DomainRule(format!(
                "Cannot {} inactive account '{}'",
                action, self.name
            )))
        }
    }

    fn ensure_movable(&self, amount: &Money) -> LedgerResult<()> {
        if !self.balance.same_currency(amount) {
            return Err(LedgerError::Validation(format!(
                "Currency mismatch: account '{}' holds {}, amount is {}",
                self.name,
                self.currency(),
                amount.currency()
            )));
        }
        if !amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }
        Ok(())
    }

    fn insufficient_funds(&self, requested: &Money) -> LedgerError {
        LedgerError::InsufficientFunds {
            account: self.name.clone(),
            requested: requested.to_string(),
            available: self.balance.to_string(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.balance)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    AccountNumberTooLong(usize),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Account name too long ({} chars, max {})",
                len, MAX_NAME_LENGTH
            ),
            Self::AccountNumberTooLong(len) => write!(
                f,
                "Account number too long ({} chars, max {})",
                len, MAX_ACCOUNT_NUMBER_LENGTH
            ),
        }
    }
}

impl std::error::Error for AccountValidationError {}

impl From<AccountValidationError> for LedgerError {
    fn from(err: AccountValidationError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

fn validate_name(name: &str) -> Result<(), AccountValidationError> {
    if name.trim().is_empty() {
        return Err(AccountValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(AccountValidationError::NameTooLong(len));
    }
    Ok(())
}

fn validate_account_number(number: &str) -> Result<(), AccountValidationError> {
    let len = number.chars().count();
    if len > MAX_ACCOUNT_NUMBER_LENGTH {
        return Err(AccountValidationError::AccountNumberTooLong(len));
    }
    Ok(())
}
