//! Storage initialization
//!
//! Handles first-run setup and the starter category set

use crate::error::LedgerResult;
use crate::factory::EntityFactory;
use crate::models::CategoryType;

use super::Storage;

/// Starter income categories: (name, description)
pub const DEFAULT_INCOME_CATEGORIES: &[(&str, &str)] = &[
    ("Salary", "Wages and salary"),
    ("Investments", "Dividends and interest"),
    ("Gifts", "Money received as gifts"),
    ("Other Income", "Anything else coming in"),
];

/// Starter expense categories: (name, description)
pub const DEFAULT_EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "Groceries and eating out"),
    ("Transport", "Public transport, fuel, taxis"),
    ("Utilities", "Rent, power, water, internet"),
    ("Entertainment", "Leisure and hobbies"),
    ("Health", "Medicine and doctors"),
    ("Other Expenses", "Anything else going out"),
];

/// Every default category with its type
pub fn default_categories() -> impl Iterator<Item = (CategoryType, &'static str, &'static str)> {
    DEFAULT_INCOME_CATEGORIES
        .iter()
        .map(|(n, d)| (CategoryType::Income, *n, *d))
        .chain(
            DEFAULT_EXPENSE_CATEGORIES
                .iter()
                .map(|(n, d)| (CategoryType::Expense, *n, *d)),
        )
}

/// Initialize storage for a fresh installation
///
/// Seeds the default categories when none exist yet and writes them to disk.
/// Returns how many categories were created.
pub fn initialize_storage(storage: &Storage) -> LedgerResult<usize> {
    if storage.categories.count()? > 0 {
        return Ok(0);
    }

    let factory = EntityFactory::new();
    let mut created = 0;
    for (category_type, name, description) in default_categories() {
        storage
            .categories
            .insert(factory.create_category(category_type, name, description)?)?;
        created += 1;
    }

    storage.categories.save()?;
    Ok(created)
}

/// Check if storage needs initialization
pub fn needs_initialization(storage: &Storage) -> LedgerResult<bool> {
    Ok(storage.categories.count()? == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_defaults_once() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();

        assert!(needs_initialization(&storage).unwrap());
        let created = initialize_storage(&storage).unwrap();
        assert_eq!(created, 10);
        assert!(!needs_initialization(&storage).unwrap());
        assert!(paths.categories_file().exists());

        assert_eq!(initialize_storage(&storage).unwrap(), 0);
        assert_eq!(storage.categories.count().unwrap(), 10);
    }

    #[test]
    fn test_defaults_have_both_types() {
        let storage = Storage::in_memory();
        initialize_storage(&storage).unwrap();
        assert_eq!(
            storage.categories.get_by_type(CategoryType::Income).unwrap().len(),
            4
        );
        assert!(storage.categories.get_by_name("Health").unwrap().is_some());
    }
}
