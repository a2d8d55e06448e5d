//! Category repository
//!
//! Manages loading and saving categories to categories.json

use std::path::PathBuf;
use std::time::Duration;

use crate::error::LedgerResult;
use crate::models::{Category, CategoryId, CategoryType};

use super::collection::Collection;

/// Repository for category persistence
pub struct CategoryRepository {
    items: Collection<Category>,
}

impl CategoryRepository {
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

    pub fn get(&self, id: CategoryId) -> LedgerResult<Option<Category>> {
        self.items.get(id)
    }

    /// All categories, income first, then by name
    pub fn get_all(&self) -> LedgerResult<Vec<Category>> {
        let mut categories = self.items.values()?;
        categories.sort_by(|a, b| {
            a.is_expense()
                .cmp(&b.is_expense())
                .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(categories)
    }

    pub fn get_by_type(&self, category_type: CategoryType) -> LedgerResult<Vec<Category>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|c| c.category_type == category_type)
            .collect())
    }

    /// Get a category by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> LedgerResult<Option<Category>> {
        let name_lower = name.trim().to_lowercase();
        self.items.find(|c| c.name.to_lowercase() == name_lower)
    }

    /// Get a category by name and type (case-insensitive)
    pub fn get_by_name_and_type(
        &self,
        name: &str,
        category_type: CategoryType,
    ) -> LedgerResult<Option<Category>> {
        let name_lower = name.trim().to_lowercase();
        self.items
            .find(|c| c.category_type == category_type && c.name.to_lowercase() == name_lower)
    }

    pub fn insert(&self, category: Category) -> LedgerResult<()> {
        self.items.insert(category)
    }

    pub fn update(&self, category: Category) -> LedgerResult<()> {
        self.items.update(category)
    }

    pub fn delete(&self, id: CategoryId) -> LedgerResult<Option<Category>> {
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

    pub(crate) fn collection(&self) -> &Collection<Category> {
        &self.items
    }
}
