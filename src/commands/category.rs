//! Category creation command and the find-or-create helpers shared by
//! commands that book against system categories

use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryId, CategoryType};

use super::{CommandBody, CommandOutput};

/// Create a category; undo deletes it again
///
/// The category is built once. Redo inserts the same category, so commands
/// further along the history that refer to its id keep working.
pub struct CreateCategory {
    category_type: CategoryType,
    name: String,
    description: String,
    prepared: Option<Category>,
    created: Option<CategoryId>,
}

impl CreateCategory {
    pub fn new(
        category_type: CategoryType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category_type,
            name: name.into(),
            description: description.into(),
            prepared: None,
            created: None,
        }
    }
}

impl CommandBody for CreateCategory {
    fn name(&self) -> String {
        format!("Create category: {}", self.name)
    }

    fn kind(&self) -> &'static str {
        "Create category"
    }

    fn do_execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput> {
        let category = match &self.prepared {
            Some(category) => category.clone(),
            None => ctx
                .factory()
                .create_category(self.category_type, &self.name, &self.description)?,
        };

        if ctx
            .categories()
            .get_by_name_and_type(&category.name, category.category_type)?
            .is_some()
        {
            return Err(LedgerError::Duplicate {
                entity_type: "Category",
                identifier: category.name,
            });
        }

        ctx.categories().insert(category.clone())?;
        self.created = Some(category.id);
        self.prepared = Some(category.clone());
        Ok(CommandOutput::Category(category))
    }

    fn do_undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()> {
        let id = self
            .created
            .ok_or_else(|| LedgerError::NotExecuted(self.name()))?;

        let in_use = ctx.operations().get_by_category(id)?.len();
        if in_use > 0 {
            return Err(LedgerError::DomainRule(format!(
                "Category '{}' is used by {} operation(s)",
                self.name, in_use
            )));
        }

        ctx.categories()
            .delete(id)?
            .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;
        self.created = None;
        Ok(())
    }
}

/// A system category a command books against
#[derive(Debug, Clone)]
pub(crate) struct SystemCategory {
    pub category: Category,
    /// Set when the command created it rather than found it
    pub created: bool,
}

/// Find a category by name and type, creating it when missing
pub(crate) fn ensure_category(
    ctx: &LedgerContext,
    name: &str,
    category_type: CategoryType,
    description: &str,
) -> LedgerResult<SystemCategory> {
    if let Some(existing) = ctx.categories().get_by_name_and_type(name, category_type)? {
        return Ok(SystemCategory {
            category: existing,
            created: false,
        });
    }

    let category = ctx
        .factory()
        .create_category(category_type, name, description)?;
    ctx.categories().insert(category.clone())?;
    Ok(SystemCategory {
        category,
        created: true,
    })
}

/// Delete a category a command created, unless operations still use it
pub(crate) fn release_category(ctx: &LedgerContext, id: CategoryId) -> LedgerResult<()> {
    if ctx.operations().get_by_category(id)?.is_empty() {
        ctx.categories().delete(id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{BaseCommand, Command};

    #[test]
    fn test_create_and_undo() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(CreateCategory::new(
            CategoryType::Expense,
            "Books",
            "Paper and e-books",
        ));

        let category = cmd.execute(&ctx).unwrap().into_category().unwrap();
        assert_eq!(cmd.name(), "Create category: Books");
        assert!(ctx.categories().get(category.id).unwrap().is_some());

        cmd.undo(&ctx).unwrap();
        assert!(ctx.categories().get(category.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_of_same_type_refused() {
        let ctx = LedgerContext::in_memory();
        BaseCommand::new(CreateCategory::new(CategoryType::Expense, "Food", ""))
            .execute(&ctx)
            .unwrap();

        let err = BaseCommand::new(CreateCategory::new(CategoryType::Expense, "food", ""))
            .execute(&ctx)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));

        // Same name, other type is fine
        BaseCommand::new(CreateCategory::new(CategoryType::Income, "Food", ""))
            .execute(&ctx)
            .unwrap();
    }

    #[test]
    fn test_invalid_category_is_validation_error() {
        let ctx = LedgerContext::in_memory();
        let err = BaseCommand::new(CreateCategory::new(CategoryType::Income, "", ""))
            .execute(&ctx)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ctx.categories().count().unwrap(), 0);
    }

    #[test]
    fn test_ensure_category_reuses_existing() {
        let ctx = LedgerContext::in_memory();
        let first = ensure_category(&ctx, "Transfer", CategoryType::Expense, "").unwrap();
        let second = ensure_category(&ctx, "transfer", CategoryType::Expense, "").unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.category.id, second.category.id);
        assert_eq!(ctx.categories().count().unwrap(), 1);

        release_category(&ctx, first.category.id).unwrap();
        assert_eq!(ctx.categories().count().unwrap(), 0);
    }

    #[test]
    fn test_redo_keeps_category_id() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(CreateCategory::new(CategoryType::Income, "Bonus", ""));

        let first = cmd.execute(&ctx).unwrap().into_category().unwrap();
        cmd.undo(&ctx).unwrap();
        let again = cmd.execute(&ctx).unwrap().into_category().unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(ctx.categories().get(first.id).unwrap().unwrap().name, "Bonus");
    }
}
