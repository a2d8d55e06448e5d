//! Storage layer for the ledger
//!
//! Provides in-memory repositories guarded by one lock per collection, JSON
//! snapshot persistence with atomic writes, and the unit-of-work boundary the
//! command pipeline brackets each command with.

pub mod accounts;
pub mod cache;
pub mod categories;
pub(crate) mod collection;
pub mod file_io;
pub mod init;
pub mod operations;

pub use accounts::AccountRepository;
pub use cache::{CacheStats, DEFAULT_CACHE_TTL};
pub use categories::CategoryRepository;
pub use collection::Keyed;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use operations::OperationRepository;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, Category, CategoryId, Operation, OperationId};

/// Transaction boundary plus access to the three repositories
///
/// `begin`/`commit`/`rollback` bracket a single command. They give no
/// isolation from concurrent callers.
pub trait UnitOfWork: Send + Sync {
    fn accounts(&self) -> &AccountRepository;
    fn categories(&self) -> &CategoryRepository;
    fn operations(&self) -> &OperationRepository;

    fn begin(&self) -> LedgerResult<()>;
    fn commit(&self) -> LedgerResult<()>;
    fn rollback(&self) -> LedgerResult<()>;
    fn in_transaction(&self) -> bool;
}

/// Collections as they were when a transaction began
struct Snapshot {
    accounts: HashMap<AccountId, Account>,
    categories: HashMap<CategoryId, Category>,
    operations: HashMap<OperationId, Operation>,
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: Option<LedgerPaths>,
    pub accounts: AccountRepository,
    pub categories: CategoryRepository,
    pub operations: OperationRepository,
    transaction: Mutex<Option<Snapshot>>,
}

impl Storage {
    /// Create storage backed by JSON files under `paths`
    pub fn new(paths: LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: AccountRepository::new(paths.accounts_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            operations: OperationRepository::new(paths.operations_file()),
            paths: Some(paths),
            transaction: Mutex::new(None),
        })
    }

    /// Create storage that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            paths: None,
            accounts: AccountRepository::in_memory(),
            categories: CategoryRepository::in_memory(),
            operations: OperationRepository::in_memory(),
            transaction: Mutex::new(None),
        }
    }

    /// Front lookups by id in every repository with a cache
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.accounts.enable_cache(ttl);
        self.categories.enable_cache(ttl);
        self.operations.enable_cache(ttl);
        debug!(ttl_secs = ttl.as_secs(), "read cache enabled");
        self
    }

    /// Combined cache counters, `None` when caching is off
    pub fn cache_stats(&self) -> Option<CacheStats> {
        let accounts = self.accounts.collection().cache_stats()?;
        let categories = self.categories.collection().cache_stats()?;
        let operations = self.operations.collection().cache_stats()?;
        Some(accounts + categories + operations)
    }

    /// Get the paths configuration, if this storage is file-backed
    pub fn paths(&self) -> Option<&LedgerPaths> {
        self.paths.as_ref()
    }

    /// Load all data from disk
    pub fn load_all(&self) -> LedgerResult<()> {
        self.accounts.load()?;
        self.categories.load()?;
        self.operations.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> LedgerResult<()> {
        self.accounts.save()?;
        self.categories.save()?;
        self.operations.save()?;
        Ok(())
    }

    fn take_snapshot(&self) -> LedgerResult<Snapshot> {
        Ok(Snapshot {
            accounts: self.accounts.collection().snapshot()?,
            categories: self.categories.collection().snapshot()?,
            operations: self.operations.collection().snapshot()?,
        })
    }

    fn transaction_slot(&self) -> LedgerResult<std::sync::MutexGuard<'_, Option<Snapshot>>> {
        self.transaction
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire transaction lock: {}", e)))
    }
}

impl UnitOfWork for Storage {
    fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    fn operations(&self) -> &OperationRepository {
        &self.operations
    }

    fn begin(&self) -> LedgerResult<()> {
        let mut slot = self.transaction_slot()?;
        if slot.is_some() {
            return Err(LedgerError::Storage("A transaction is already active".into()));
        }
        *slot = Some(self.take_snapshot()?);
        debug!("transaction started");
        Ok(())
    }

    fn commit(&self) -> LedgerResult<()> {
        let mut slot = self.transaction_slot()?;
        if slot.take().is_none() {
            return Err(LedgerError::Storage("No active transaction to commit".into()));
        }
        debug!("transaction committed");
        Ok(())
    }

    /// Restore the collections captured by `begin`
    fn rollback(&self) -> LedgerResult<()> {
        let snapshot = self
            .transaction_slot()?
            .take()
            .ok_or_else(|| LedgerError::Storage("No active transaction to roll back".into()))?;

        self.accounts.collection().restore(snapshot.accounts)?;
        self.categories.collection().restore(snapshot.categories)?;
        self.operations.collection().restore(snapshot.operations)?;
        debug!("transaction rolled back");
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.transaction
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryType, Money};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(storage.paths().is_some());
        assert!(Storage::in_memory().paths().is_none());
    }

    #[test]
    fn test_save_all_and_load_all() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let storage = Storage::new(paths.clone()).unwrap();
        storage
            .accounts
            .insert(Account::new("Cash", Money::new(dec!(5), "RUB").unwrap(), ""))
            .unwrap();
        storage
            .categories
            .insert(Category::new(CategoryType::Income, "Salary", ""))
            .unwrap();
        storage.save_all().unwrap();

        let reopened = Storage::new(paths).unwrap();
        reopened.load_all().unwrap();
        assert_eq!(reopened.accounts.count().unwrap(), 1);
        assert_eq!(reopened.categories.count().unwrap(), 1);
        assert_eq!(reopened.operations.count().unwrap(), 0);
    }

    #[test]
    fn test_rollback_restores_collections() {
        let storage = Storage::in_memory();
        let kept = Account::new("Kept", Money::new(dec!(5), "RUB").unwrap(), "");
        let kept_id = kept.id;
        storage.accounts.insert(kept).unwrap();

        storage.begin().unwrap();
        assert!(storage.in_transaction());
        storage
            .accounts
            .insert(Account::new("Temp", Money::zero("RUB").unwrap(), ""))
            .unwrap();
        storage.accounts.delete(kept_id).unwrap();
        storage.rollback().unwrap();

        assert!(!storage.in_transaction());
        assert_eq!(storage.accounts.count().unwrap(), 1);
        assert!(storage.accounts.exists(kept_id).unwrap());
    }

    #[test]
    fn test_cached_lookups_follow_writes_and_rollback() {
        let storage = Storage::in_memory().with_cache(DEFAULT_CACHE_TTL);
        let cash = Account::new("Cash", Money::new(dec!(5), "RUB").unwrap(), "");
        let cash_id = cash.id;
        storage.accounts.insert(cash).unwrap();

        assert_eq!(storage.accounts.get(cash_id).unwrap().unwrap().name, "Cash");
        let stats = storage.cache_stats().unwrap();
        assert_eq!(stats.hits, 1);

        storage.begin().unwrap();
        let mut renamed = storage.accounts.get(cash_id).unwrap().unwrap();
        renamed.name = "Wallet".into();
        storage.accounts.update(renamed).unwrap();
        assert_eq!(storage.accounts.get(cash_id).unwrap().unwrap().name, "Wallet");
        storage.rollback().unwrap();

        assert_eq!(storage.accounts.get(cash_id).unwrap().unwrap().name, "Cash");
        storage.accounts.delete(cash_id).unwrap();
        assert!(storage.accounts.get(cash_id).unwrap().is_none());
    }

    #[test]
    fn test_cache_off_by_default() {
        assert!(Storage::in_memory().cache_stats().is_none());
    }

    #[test]
    fn test_commit_keeps_changes_and_rejects_nesting() {
        let storage = Storage::in_memory();
        storage.begin().unwrap();
        assert!(storage.begin().is_err());
        storage
            .categories
            .insert(Category::new(CategoryType::Expense, "Food", ""))
            .unwrap();
        storage.commit().unwrap();

        assert_eq!(storage.categories.count().unwrap(), 1);
        assert!(storage.commit().is_err());
        assert!(storage.rollback().is_err());
    }
}
