//! Account service
//!
//! Lookup and maintenance of accounts outside the undoable command flow:
//! renaming, activation, deletion of emptied accounts and balance totals.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::models::ids::single_match;
use crate::models::{Account, AccountId, Money};
use crate::storage::UnitOfWork;

/// Service for account management
pub struct AccountService<'a> {
    store: &'a dyn UnitOfWork,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a dyn UnitOfWork) -> Self {
        Self { store }
    }

    pub fn get(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.store.accounts().get(id)
    }

    /// All accounts, or only the active ones
    pub fn list(&self, include_inactive: bool) -> LedgerResult<Vec<Account>> {
        if include_inactive {
            self.store.accounts().get_all()
        } else {
            self.store.accounts().get_active()
        }
    }

    pub fn list_active(&self) -> LedgerResult<Vec<Account>> {
        self.store.accounts().get_active()
    }

    /// Find an account by name, ID (full or short form) or account number
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Account>> {
        let identifier = identifier.trim();

        if let Some(account) = self.store.accounts().get_by_name(identifier)? {
            return Ok(Some(account));
        }

        if let Some(account) = single_match(self.store.accounts().get_all()?, identifier, |a| {
            a.id.matches(identifier)
        })? {
            return Ok(Some(account));
        }

        self.store.accounts().get_by_account_number(identifier)
    }

    /// Like `find`, but a missing account is an error
    pub fn require(&self, identifier: &str) -> LedgerResult<Account> {
        self.find(identifier)?
            .ok_or_else(|| LedgerError::account_not_found(identifier))
    }

    pub fn rename(&self, id: AccountId, name: &str) -> LedgerResult<Account> {
        let mut account = self.load(id)?;
        let name = name.trim();

        if let Some(other) = self.store.accounts().get_by_name(name)? {
            if other.id != id {
                return Err(LedgerError::Duplicate {
                    entity_type: "Account",
                    identifier: name.to_string(),
                });
            }
        }

        account.rename(name)?;
        self.store.accounts().update(account.clone())?;
        Ok(account)
    }

    pub fn set_account_number(&self, id: AccountId, number: &str) -> LedgerResult<Account> {
        let mut account = self.load(id)?;
        account.set_account_number(number.trim())?;
        self.store.accounts().update(account.clone())?;
        Ok(account)
    }

    pub fn activate(&self, id: AccountId) -> LedgerResult<Account> {
        let mut account = self.load(id)?;
        account.activate();
        self.store.accounts().update(account.clone())?;
        Ok(account)
    }

    /// Inactive accounts refuse deposits, withdrawals and transfers
    pub fn deactivate(&self, id: AccountId) -> LedgerResult<Account> {
        let mut account = self.load(id)?;
        account.deactivate();
        self.store.accounts().update(account.clone())?;
        Ok(account)
    }

    /// Delete an account whose balance is zero, along with its operations
    ///
    /// Returns the deleted account and how many operations went with it.
    pub fn delete(&self, id: AccountId) -> LedgerResult<(Account, usize)> {
        let account = self.load(id)?;
        if !account.balance.is_zero() {
            return Err(LedgerError::DomainRule(format!(
                "Cannot delete account '{}' with a non-zero balance of {}",
                account.name, account.balance
            )));
        }

        let operations = self.store.operations().get_by_account(id)?;
        for operation in &operations {
            self.store.operations().delete(operation.id)?;
        }
        self.store.accounts().delete(id)?;

        info!(account = %account.name, operations = operations.len(), "Account deleted");
        Ok((account, operations.len()))
    }

    /// Sum of the balances of active accounts held in `currency`
    pub fn total_balance(&self, currency: &str) -> LedgerResult<Money> {
        let balances: Vec<Money> = self
            .store
            .accounts()
            .get_active()?
            .into_iter()
            .map(|a| a.balance)
            .filter(|b| b.currency().eq_ignore_ascii_case(currency))
            .collect();
        Money::sum(currency, &balances)
    }

    /// Totals of active accounts per currency
    pub fn total_balances_by_currency(&self) -> LedgerResult<BTreeMap<String, Money>> {
        let mut totals: BTreeMap<String, Money> = BTreeMap::new();
        for account in self.store.accounts().get_active()? {
            let currency = account.currency().to_string();
            let total = match totals.remove(&currency) {
                Some(total) => total.checked_add(&account.balance)?,
                None => account.balance,
            };
            totals.insert(currency, total);
        }
        Ok(totals)
    }

    fn load(&self, id: AccountId) -> LedgerResult<Account> {
        self.store
            .accounts()
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }
}
