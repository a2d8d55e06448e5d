//! Entity factory
//!
//! Builds validated accounts, categories and operations with freshly
//! generated identifiers. Commands go through the factory instead of calling
//! the model constructors directly so every entity entering storage has been
//! checked once.

use chrono::{DateTime, Utc};

use crate::error::{LedgerError, LedgerResult};
use crate::models::operation::validate_description;
use crate::models::{
    Account, AccountId, Category, CategoryId, CategoryType, Money, Operation, OperationType,
};

/// Creates validated entities
#[derive(Debug, Clone, Default)]
pub struct EntityFactory;

impl EntityFactory {
    pub fn new() -> Self {
        Self
    }

    /// Build an active bank account; the opening balance may be zero but not negative
    pub fn create_bank_account(
        &self,
        name: &str,
        initial_balance: Money,
        account_number: &str,
    ) -> LedgerResult<Account> {
        if initial_balance.is_negative() {
            return Err(LedgerError::Validation(format!(
                "Initial balance cannot be negative, got {}",
                initial_balance
            )));
        }

        let account = Account::new(name.trim(), initial_balance, account_number.trim());
        account.validate()?;
        Ok(account)
    }

    /// Build a category with default colour and icon
    pub fn create_category(
        &self,
        category_type: CategoryType,
        name: &str,
        description: &str,
    ) -> LedgerResult<Category> {
        let category = Category::new(category_type, name.trim(), description.trim());
        category.validate()?;
        Ok(category)
    }

    /// Build an operation; the amount must be strictly positive
    pub fn create_operation(
        &self,
        operation_type: OperationType,
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: &str,
        date: DateTime<Utc>,
    ) -> LedgerResult<Operation> {
        if !amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "Operation amount must be positive, got {}",
                amount
            )));
        }
        validate_description(description)?;

        Ok(Operation::new(
            operation_type,
            account_id,
            amount,
            category_id,
            description,
            date,
        ))
    }
}
