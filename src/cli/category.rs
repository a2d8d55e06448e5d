//! Category CLI commands

use clap::Subcommand;

use crate::display::category::{format_category_details, format_category_list};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::models::CategoryType;

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create a new category
    Create {
        /// Category name
        name: String,
        /// income or expense
        #[arg(short = 't', long = "type")]
        category_type: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List categories
    List {
        /// Only income or only expense categories
        #[arg(short = 't', long = "type")]
        category_type: Option<String>,
    },
    /// Show category details
    Show {
        /// Category name or ID
        category: String,
    },
    /// Delete a category no operation uses
    Delete {
        category: String,
    },
    /// Create the starter categories that are missing
    Defaults,
}

pub(crate) fn parse_category_type(text: &str) -> LedgerResult<CategoryType> {
    CategoryType::parse(text).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid category type: '{}'. Valid types: income, expense",
            text
        ))
    })
}

/// Handle a category command
pub fn handle_category_command(ledger: &mut Ledger, cmd: CategoryCommands) -> LedgerResult<()> {
    match cmd {
        CategoryCommands::Create {
            name,
            category_type,
            description,
        } => {
            let category_type = parse_category_type(&category_type)?;
            let category = ledger.create_category(category_type, &name, &description)?;
            println!("Created category: {}", category);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::List { category_type } => {
            let categories = match category_type {
                Some(text) => ledger.categories().list_by_type(parse_category_type(&text)?)?,
                None => ledger.categories().list()?,
            };
            print!("{}", format_category_list(&categories));
            if categories.is_empty() {
                println!();
            }
        }

        CategoryCommands::Show { category } => {
            let service = ledger.categories();
            let found = service.require(&category)?;
            let usage = service.usage(found.id)?;
            print!("{}", format_category_details(&found, usage));
        }

        CategoryCommands::Delete { category } => {
            let service = ledger.categories();
            let found = service.require(&category)?;
            service.delete(found.id)?;
            println!("Deleted category: {}", found);
        }

        CategoryCommands::Defaults => {
            let created = ledger.create_default_categories()?;
            if created.is_empty() {
                println!("All default categories already exist.");
            } else {
                println!("Created {} default categories:", created.len());
                for category in created {
                    println!("  - {}", category);
                }
            }
        }
    }

    Ok(())
}
