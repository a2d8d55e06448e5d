//! Operation repository
//!
//! Manages loading and saving operations to operations.json. Lists returned
//! from the finders are ordered newest first.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::LedgerResult;
use crate::models::{AccountId, CategoryId, DateRange, Operation, OperationId, OperationType};

use super::collection::Collection;

/// Repository for operation persistence
pub struct OperationRepository {
    items: Collection<Operation>,
}

impl OperationRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            items: Collection::new(Some(path)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            items: Collection::new(None),
        }
    }

    pub fn load(&self) -> LedgerResult<()> {
        self.items.load()
    }

    pub fn save(&self) -> LedgerResult<()> {
        self.items.save()
    }

    pub fn get(&self, id: OperationId) -> LedgerResult<Option<Operation>> {
        self.items.get(id)
    }

    pub fn get_all(&self) -> LedgerResult<Vec<Operation>> {
        self.find_where(|_| true)
    }

    /// Operations booked against an account, newest first
    pub fn get_by_account(&self, account_id: AccountId) -> LedgerResult<Vec<Operation>> {
        self.find_where(|op| op.account_id == account_id)
    }

    pub fn get_by_category(&self, category_id: CategoryId) -> LedgerResult<Vec<Operation>> {
        self.find_where(|op| op.category_id == category_id)
    }

    pub fn get_by_date_range(&self, range: &DateRange) -> LedgerResult<Vec<Operation>> {
        self.find_where(|op| op.is_in_range(range))
    }

    pub fn get_by_type(&self, operation_type: OperationType) -> LedgerResult<Vec<Operation>> {
        self.find_where(|op| op.operation_type == operation_type)
    }

    /// Recurring templates
    pub fn get_recurring(&self) -> LedgerResult<Vec<Operation>> {
        self.find_where(|op| op.is_recurring)
    }

    /// Operations matching an arbitrary predicate, newest first
    pub fn find_where(&self, predicate: impl Fn(&Operation) -> bool) -> LedgerResult<Vec<Operation>> {
        let mut operations = self.items.filter(predicate)?;
        operations.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(operations)
    }

    pub fn insert(&self, operation: Operation) -> LedgerResult<()> {
        self.items.insert(operation)
    }

    pub fn update(&self, operation: Operation) -> LedgerResult<()> {
        self.items.update(operation)
    }

    pub fn delete(&self, id: OperationId) -> LedgerResult<Option<Operation>> {
        self.items.delete(id)
    }

    pub fn count(&self) -> LedgerResult<usize> {
        self.items.count()
    }

    pub fn clear(&self) -> LedgerResult<()> {
        self.items.clear()
    }

    pub(crate) fn enable_cache(&mut self, ttl: Duration) {
        self.items.enable_cache(ttl);
    }

    pub(crate) fn collection(&self) -> &Collection<Operation> {
        &self.items
    }
}
