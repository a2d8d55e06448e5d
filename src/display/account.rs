//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use std::collections::BTreeMap;

use crate::models::{Account, Money};

/// Format accounts as a table, followed by one total row per currency
pub fn format_account_list(accounts: &[Account], totals: &BTreeMap<String, Money>) -> String {
    if accounts.is_empty() {
        return "No accounts found.".to_string();
    }

    let name_width = accounts
        .iter()
        .map(|a| a.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>16}  {:<20}  {:<12}  {}\n",
        "Name",
        "Balance",
        "Number",
        "ID",
        "Status",
        name_width = name_width,
    ));

    output.push_str(&format!(
        "{:-<name_width$}  {:->16}  {:-<20}  {:-<12}  {:-<8}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for account in accounts {
        let status = if account.is_active { "" } else { "Inactive" };
        output.push_str(&format!(
            "{:<name_width$}  {:>16}  {:<20}  {:<12}  {}\n",
            account.name,
            account.balance.to_string(),
            account.account_number,
            account.id.to_string(),
            status,
            name_width = name_width,
        ));
    }

    if !totals.is_empty() {
        output.push_str(&format!(
            "{:-<name_width$}  {:->16}\n",
            "",
            "",
            name_width = name_width,
        ));
        for total in totals.values() {
            output.push_str(&format!(
                "{:<name_width$}  {:>16}\n",
                "TOTAL",
                total.to_string(),
                name_width = name_width,
            ));
        }
    }

    output
}

/// Format a single account's details
pub fn format_account_details(account: &Account, operation_count: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:          {}\n", account.id));
    if !account.account_number.is_empty() {
        output.push_str(&format!("  Number:      {}\n", account.account_number));
    }
    output.push_str(&format!(
        "  Active:      {}\n",
        if account.is_active { "Yes" } else { "No" }
    ));
    output.push_str(&format!("  Balance:     {}\n", account.balance));
    output.push_str(&format!("  Operations:  {}\n", operation_count));

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        account.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        account.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}
