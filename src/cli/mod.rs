//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the ledger facade and its services. The same
//! commands drive both one-shot invocations and the interactive shell.

pub mod account;
pub mod category;
pub mod operation;
pub mod reconcile;
pub mod report;
pub mod shell;
pub mod transfer;

pub use account::{handle_account_command, AccountCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use operation::{handle_operation_command, OperationCommands};
pub use reconcile::handle_reconcile_command;
pub use report::{handle_report_command, ReportOptions};
pub use shell::run_shell;
pub use transfer::{handle_deposit_command, handle_transfer_command, handle_withdraw_command};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use clap::Subcommand;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::models::DateRange;

/// Commands that work on the ledger
#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Income and expense operations
    #[command(subcommand, alias = "operation")]
    Op(OperationCommands),

    /// Put money into an account
    Deposit {
        /// Account name, ID or number
        account: String,
        amount: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Take money out of an account
    Withdraw {
        /// Account name, ID or number
        account: String,
        amount: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Move money between two accounts
    Transfer {
        /// Source account
        from: String,
        /// Destination account
        to: String,
        amount: String,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Compare stored balances with the operations behind them
    Reconcile {
        /// Only this account
        #[arg(short, long)]
        account: Option<String>,
        /// Overwrite drifted balances
        #[arg(long)]
        fix: bool,
    },

    /// Income and expense by category over a period
    Report {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Show only the N largest categories of each type
        #[arg(long)]
        top: Option<usize>,
        /// Currency to report in; the configured default when omitted
        #[arg(short, long)]
        currency: Option<String>,
        /// Draw the expense distribution as a bar chart
        #[arg(long)]
        chart: bool,
        /// Also show this year's average monthly income and expense
        #[arg(long)]
        averages: bool,
    },

    /// Command timing statistics
    Stats {
        /// Clear the statistics after printing them
        #[arg(long)]
        reset: bool,
    },
}

/// Run one ledger command
pub fn run_command(ledger: &mut Ledger, cmd: LedgerCommands) -> LedgerResult<()> {
    match cmd {
        LedgerCommands::Account(cmd) => handle_account_command(ledger, cmd),
        LedgerCommands::Category(cmd) => handle_category_command(ledger, cmd),
        LedgerCommands::Op(cmd) => handle_operation_command(ledger, cmd),
        LedgerCommands::Deposit {
            account,
            amount,
            description,
        } => handle_deposit_command(ledger, &account, &amount, &description),
        LedgerCommands::Withdraw {
            account,
            amount,
            description,
        } => handle_withdraw_command(ledger, &account, &amount, &description),
        LedgerCommands::Transfer {
            from,
            to,
            amount,
            description,
        } => handle_transfer_command(ledger, &from, &to, &amount, description.as_deref()),
        LedgerCommands::Reconcile { account, fix } => {
            handle_reconcile_command(ledger, account.as_deref(), fix)
        }
        LedgerCommands::Report {
            from,
            to,
            top,
            currency,
            chart,
            averages,
        } => handle_report_command(
            ledger,
            ReportOptions {
                from: from.as_deref(),
                to: to.as_deref(),
                top,
                currency: currency.as_deref(),
                chart,
                averages,
            },
        ),
        LedgerCommands::Stats { reset } => {
            print!("{}", ledger.performance_report());
            if let Some(cache) = ledger.cache_stats() {
                println!(
                    "Cache: {} hits, {} misses ({:.1}% hit rate), {} entries",
                    cache.hits,
                    cache.misses,
                    cache.hit_rate(),
                    cache.entries
                );
            }
            if reset {
                ledger.reset_statistics();
                println!("Statistics cleared.");
            }
            Ok(())
        }
    }
}

/// Parse a YYYY-MM-DD date
pub(crate) fn parse_date(text: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
        LedgerError::Validation(format!("Invalid date format: '{}'. Use YYYY-MM-DD", text))
    })
}

pub(crate) fn midday(date: NaiveDate) -> LedgerResult<DateTime<Utc>> {
    date.and_hms_opt(12, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt))
        .ok_or_else(|| LedgerError::Validation(format!("Invalid date {}", date)))
}

pub(crate) fn end_of_day(date: NaiveDate) -> LedgerResult<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|dt| Utc.from_utc_datetime(&dt))
        .ok_or_else(|| LedgerError::Validation(format!("Invalid date {}", date)))
}

/// Whole days from `from` through `to`
///
/// A missing end means today; a missing start means the first day of the
/// end's month. With neither, the current month.
pub(crate) fn date_range(from: Option<&str>, to: Option<&str>) -> LedgerResult<DateRange> {
    if from.is_none() && to.is_none() {
        return Ok(DateRange::this_month());
    }

    let end = match to {
        Some(text) => parse_date(text)?,
        None => Utc::now().date_naive(),
    };
    let start = match from {
        Some(text) => parse_date(text)?,
        None => end.with_day(1).unwrap_or(end),
    };
    DateRange::from_dates(start, end)
}
