//! Category service
//!
//! Lookup, editing and deletion of categories. Creation goes through the
//! undoable `CreateCategory` command.

use crate::error::{LedgerError, LedgerResult};
use crate::models::ids::single_match;
use crate::models::{Category, CategoryId, CategoryType};
use crate::storage::UnitOfWork;

/// Fields to change on a category; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Service for category management
pub struct CategoryService<'a> {
    store: &'a dyn UnitOfWork,
}

impl<'a> CategoryService<'a> {
    pub fn new(store: &'a dyn UnitOfWork) -> Self {
        Self { store }
    }

    /// All categories, income first
    pub fn list(&self) -> LedgerResult<Vec<Category>> {
        self.store.categories().get_all()
    }

    pub fn list_by_type(&self, category_type: CategoryType) -> LedgerResult<Vec<Category>> {
        self.store.categories().get_by_type(category_type)
    }

    /// Find a category by name or ID
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Category>> {
        let identifier = identifier.trim();

        if let Some(category) = self.store.categories().get_by_name(identifier)? {
            return Ok(Some(category));
        }

        single_match(self.store.categories().get_all()?, identifier, |c| {
            c.id.matches(identifier)
        })
    }

    /// Find a category of a given type by name or ID
    pub fn find_of_type(
        &self,
        identifier: &str,
        category_type: CategoryType,
    ) -> LedgerResult<Option<Category>> {
        let identifier = identifier.trim();

        if let Some(category) = self
            .store
            .categories()
            .get_by_name_and_type(identifier, category_type)?
        {
            return Ok(Some(category));
        }

        single_match(self.store.categories().get_by_type(category_type)?, identifier, |c| {
            c.id.matches(identifier)
        })
    }

    pub fn require(&self, identifier: &str) -> LedgerResult<Category> {
        self.find(identifier)?
            .ok_or_else(|| LedgerError::category_not_found(identifier))
    }

    pub fn update(&self, id: CategoryId, changes: CategoryUpdate) -> LedgerResult<Category> {
        let mut category = self.load(id)?;

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if let Some(other) = self
                .store
                .categories()
                .get_by_name_and_type(&name, category.category_type)?
            {
                if other.id != id {
                    return Err(LedgerError::Duplicate {
                        entity_type: "Category",
                        identifier: name,
                    });
                }
            }
            category.name = name;
        }
        if let Some(description) = changes.description {
            category.description = description.trim().to_string();
        }
        if let Some(color) = changes.color {
            category.color = color.trim().to_string();
        }
        if let Some(icon) = changes.icon {
            category.icon = icon.trim().to_string();
        }

        category.validate()?;
        self.store.categories().update(category.clone())?;
        Ok(category)
    }

    /// Delete a category no operation refers to
    pub fn delete(&self, id: CategoryId) -> LedgerResult<Category> {
        let category = self.load(id)?;

        let in_use = self.store.operations().get_by_category(id)?.len();
        if in_use > 0 {
            return Err(LedgerError::DomainRule(format!(
                "Category '{}' is used by {} operation(s)",
                category.name, in_use
            )));
        }

        self.store.categories().delete(id)?;
        Ok(category)
    }

    /// Number of operations booked under a category
    pub fn usage(&self, id: CategoryId) -> LedgerResult<usize> {
        Ok(self.store.operations().get_by_category(id)?.len())
    }

    fn load(&self, id: CategoryId) -> LedgerResult<Category> {
        self.store
            .categories()
            .get(id)?
            .ok_or_else(|| LedgerError::category_not_found(id.to_string()))
    }
}
