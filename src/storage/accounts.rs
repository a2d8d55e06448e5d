//! Account repository
//!
//! Manages loading and saving accounts to accounts.json

use std::path::PathBuf;
use std::time::Duration;

use crate::error::LedgerResult;
use crate::models::{Account, AccountId};

use super::collection::Collection;

/// Repository for account persistence
pub struct AccountRepository {
    items: Collection<Account>,
}

impl AccountRepository {
    /// Create a repository backed by a snapshot file
    pub fn new(path: PathBuf) -> Self {
        Self {
            items: Collection::new(Some(path)),
        }
    }

    /// Create a repository that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            items: Collection::new(None),
        }
    }

    /// Load accounts from disk
    pub fn load(&self) -> LedgerResult<()> {
        self.items.load()
    }

    /// Save accounts to disk
    pub fn save(&self) -> LedgerResult<()> {
        self.items.save()
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.items.get(id)
    }

    /// Get all accounts, sorted by name
    pub fn get_all(&self) -> LedgerResult<Vec<Account>> {
        let mut accounts = self.items.values()?;
        accounts.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(accounts)
    }

    /// Get all active accounts
    pub fn get_active(&self) -> LedgerResult<Vec<Account>> {
        Ok(self.get_all()?.into_iter().filter(|a| a.is_active).collect())
    }

    /// Get an account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> LedgerResult<Option<Account>> {
        let name_lower = name.trim().to_lowercase();
        self.items.find(|a| a.name.to_lowercase() == name_lower)
    }

    /// Get an account by its external number
    pub fn get_by_account_number(&self, number: &str) -> LedgerResult<Option<Account>> {
        let number = number.trim();
        if number.is_empty() {
            return Ok(None);
        }
        self.items.find(|a| a.account_number == number)
    }

    /// Insert a new account
    pub fn insert(&self, account: Account) -> LedgerResult<()> {
        self.items.insert(account)
    }

    /// Replace a stored account; not-found if it was never inserted
    pub fn update(&self, account: Account) -> LedgerResult<()> {
        self.items.update(account)
    }

    /// Delete an account, returning it if it existed
    pub fn delete(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.items.delete(id)
    }

    /// Check if an account exists
    pub fn exists(&self, id: AccountId) -> LedgerResult<bool> {
        Ok(self.items.get(id)?.is_some())
    }

    /// Count accounts
    pub fn count(&self) -> LedgerResult<usize> {
        self.items.count()
    }

    pub fn clear(&self) -> LedgerResult<()> {
        self.items.clear()
    }

    pub(crate) fn enable_cache(&mut self, ttl: Duration) {
        self.items.enable_cache(ttl);
    }

    pub(crate) fn collection(&self) -> &Collection<Account> {
        &self.items
    }
}
