//! Operation CLI commands
//!
//! Income and expense booking go through the undoable commands; listing,
//! deletion and recurring processing use the operation service.

use chrono::Utc;
use clap::{Args, Subcommand};

use crate::display::operation::{format_operation_list, NameLookup};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::models::{Money, Operation, OperationType, RecurrencePattern};

use super::{date_range, end_of_day, midday, parse_date};

/// Arguments shared by `op income` and `op expense`
#[derive(Args, Debug)]
pub struct BookingArgs {
    /// Account name, ID or number
    pub account: String,
    /// Amount in the account's currency
    pub amount: String,
    /// Category name or ID
    #[arg(short, long)]
    pub category: String,
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// Operation date (YYYY-MM-DD), today when omitted
    #[arg(long)]
    pub date: Option<String>,
    /// Repeat daily, weekly, monthly or yearly
    #[arg(short, long)]
    pub repeat: Option<String>,
}

/// Operation subcommands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Book an income
    Income(BookingArgs),
    /// Book an expense
    Expense(BookingArgs),
    /// List operations, newest first
    List {
        /// Only this account
        #[arg(short, long)]
        account: Option<String>,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Maximum number of operations shown
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Delete an operation and reconcile its account
    Delete {
        /// Operation ID (full or short form)
        operation: String,
    },
    /// Book the due occurrences of recurring operations
    ProcessRecurring {
        /// Process occurrences up to this date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        as_of: Option<String>,
    },
}

/// Handle an operation command
pub fn handle_operation_command(ledger: &mut Ledger, cmd: OperationCommands) -> LedgerResult<()> {
    match cmd {
        OperationCommands::Income(args) => book(ledger, OperationType::Income, args),
        OperationCommands::Expense(args) => book(ledger, OperationType::Expense, args),

        OperationCommands::List {
            account,
            category,
            from,
            to,
            limit,
        } => {
            let operations = ledger.operations();
            let mut found: Vec<Operation> = match &account {
                Some(reference) => {
                    let account = ledger.accounts().require(reference)?;
                    operations.list_for_account(account.id)?
                }
                None => operations.list_all()?,
            };

            if let Some(reference) = &category {
                let category = ledger.categories().require(reference)?;
                found.retain(|op| op.category_id == category.id);
            }
            if from.is_some() || to.is_some() {
                let range = date_range(from.as_deref(), to.as_deref())?;
                found.retain(|op| op.is_in_range(&range));
            }
            found.sort_by(|a, b| b.date.cmp(&a.date));
            found.truncate(limit);

            let names = NameLookup::load(ledger.context().store())?;
            print!("{}", format_operation_list(&found, &names));
            if found.is_empty() {
                println!();
            }
            Ok(())
        }

        OperationCommands::Delete { operation } => {
            let service = ledger.operations();
            let found = service.require(&operation)?;
            service.delete(found.id)?;
            println!("Deleted operation {} ({})", found.id, found.signed_amount());
            Ok(())
        }

        OperationCommands::ProcessRecurring { as_of } => {
            let as_of = match as_of {
                Some(text) => end_of_day(parse_date(&text)?)?,
                None => Utc::now(),
            };
            let created = ledger.operations().process_recurring(as_of)?;
            if created.is_empty() {
                println!("No recurring operations are due.");
            } else {
                println!("Booked {} recurring operation(s).", created.len());
            }
            Ok(())
        }
    }
}

fn book(ledger: &mut Ledger, operation_type: OperationType, args: BookingArgs) -> LedgerResult<()> {
    let account = ledger.accounts().require(&args.account)?;
    let category = ledger
        .categories()
        .find_of_type(&args.category, operation_type)?
        .ok_or_else(|| LedgerError::category_not_found(&args.category))?;
    let amount = Money::parse(&args.amount, account.currency())?;
    let pattern = args
        .repeat
        .as_deref()
        .map(|text| {
            RecurrencePattern::parse(text).ok_or_else(|| {
                LedgerError::Validation(format!(
                    "Invalid repeat pattern: '{}'. Valid patterns: daily, weekly, monthly, yearly",
                    text
                ))
            })
        })
        .transpose()?;
    let date = match &args.date {
        Some(text) => midday(parse_date(text)?)?,
        None => Utc::now(),
    };

    let mut operation = ledger.add_operation(
        operation_type,
        account.id,
        amount,
        category.id,
        &args.description,
        date,
    )?;
    if pattern.is_some() {
        operation = ledger.operations().set_recurring(operation.id, pattern)?;
    }

    println!(
        "Booked {} of {} on '{}' under '{}'",
        operation_type.to_string().to_lowercase(),
        operation.amount,
        account.name,
        category.name
    );
    if let Some(pattern) = operation.recurring_pattern {
        println!("  Repeats: {}", pattern);
    }
    println!("  ID: {}", operation.id);
    Ok(())
}

