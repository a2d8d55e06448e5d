//! Operation display formatting

use std::collections::HashMap;

use crate::error::LedgerResult;
use crate::models::{AccountId, CategoryId, Operation};
use crate::storage::UnitOfWork;

/// Account and category names for labelling operations
#[derive(Debug, Default)]
pub struct NameLookup {
    accounts: HashMap<AccountId, String>,
    categories: HashMap<CategoryId, String>,
}

impl NameLookup {
    pub fn load(store: &dyn UnitOfWork) -> LedgerResult<Self> {
        Ok(Self {
            accounts: store
                .accounts()
                .get_all()?
                .into_iter()
                .map(|a| (a.id, a.name))
                .collect(),
            categories: store
                .categories()
                .get_all()?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
        })
    }

    pub fn account(&self, id: AccountId) -> String {
        self.accounts
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn category(&self, id: CategoryId) -> String {
        self.categories
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Format operations as a register, newest first as given
pub fn format_operation_list(operations: &[Operation], names: &NameLookup) -> String {
    if operations.is_empty() {
        return "No operations found.".to_string();
    }

    let rows: Vec<(String, String)> = operations
        .iter()
        .map(|op| (names.account(op.account_id), names.category(op.category_id)))
        .collect();
    let account_width = rows
        .iter()
        .map(|(a, _)| a.chars().count())
        .max()
        .unwrap_or(7)
        .max(7);
    let category_width = rows
        .iter()
        .map(|(_, c)| c.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<10}  {:<12}  {:<account_width$}  {:<category_width$}  {:>16}  {}\n",
        "Date",
        "ID",
        "Account",
        "Category",
        "Amount",
        "Description",
        account_width = account_width,
        category_width = category_width,
    ));
    output.push_str(&format!(
        "{:-<10}  {:-<12}  {:-<account_width$}  {:-<category_width$}  {:->16}  {:-<11}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        account_width = account_width,
        category_width = category_width,
    ));

    for (op, (account, category)) in operations.iter().zip(&rows) {
        let recurring = match op.recurring_pattern {
            Some(pattern) if op.is_recurring => format!(" [{}]", pattern),
            _ => String::new(),
        };
        output.push_str(&format!(
            "{:<10}  {:<12}  {:<account_width$}  {:<category_width$}  {:>16}  {}{}\n",
            op.date.format("%Y-%m-%d").to_string(),
            op.id.to_string(),
            account,
            category,
            op.signed_amount().to_string(),
            op.description,
            recurring,
            account_width = account_width,
            category_width = category_width,
        ));
    }

    output
}

pub fn format_operation_details(operation: &Operation, names: &NameLookup) -> String {
    let mut output = String::new();

    output.push_str(&format!("Operation: {}\n", operation.id));
    output.push_str(&format!("  Type:        {}\n", operation.operation_type));
    output.push_str(&format!("  Amount:      {}\n", operation.amount));
    output.push_str(&format!("  Account:     {}\n", names.account(operation.account_id)));
    output.push_str(&format!("  Category:    {}\n", names.category(operation.category_id)));
    output.push_str(&format!(
        "  Date:        {}\n",
        operation.date.format("%Y-%m-%d %H:%M UTC")
    ));
    if !operation.description.is_empty() {
        output.push_str(&format!("  Description: {}\n", operation.description));
    }
    if let Some(pattern) = operation.recurring_pattern.filter(|_| operation.is_recurring) {
        output.push_str(&format!("  Repeats:     {}\n", pattern));
        if let Some(last) = operation.last_occurrence {
            output.push_str(&format!("  Last run:    {}\n", last.format("%Y-%m-%d")));
        }
    }

    output
}
