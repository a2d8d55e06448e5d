//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use crate::display::account::{format_account_details, format_account_list};
use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::models::Money;

/// Account subcommands
#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Opening balance (e.g., "1000.00" or "1000")
        #[arg(short, long, default_value = "0")]
        balance: String,
        /// Currency code; the configured default when omitted
        #[arg(short, long)]
        currency: Option<String>,
        /// External account number
        #[arg(short, long, default_value = "")]
        number: String,
    },
    /// List accounts
    List {
        /// Include inactive accounts
        #[arg(short, long)]
        all: bool,
    },
    /// Show account details
    Show {
        /// Account name, ID or number
        account: String,
    },
    /// Rename an account
    Rename {
        /// Account name, ID or number
        account: String,
        /// New name
        name: String,
    },
    /// Allow operations on an account again
    Activate {
        account: String,
    },
    /// Refuse further operations on an account
    Deactivate {
        account: String,
    },
    /// Delete an account with a zero balance
    Delete {
        account: String,
    },
}

/// Handle an account command
pub fn handle_account_command(ledger: &mut Ledger, cmd: AccountCommands) -> LedgerResult<()> {
    match cmd {
        AccountCommands::Create {
            name,
            balance,
            currency,
            number,
        } => {
            let currency = currency.unwrap_or_else(|| ledger.default_currency().to_string());
            let opening = Money::parse(&balance, &currency)?;
            let account = ledger.create_account(&name, opening, &number)?;

            println!("Created account: {}", account.name);
            println!("  Balance: {}", account.balance);
            if !account.account_number.is_empty() {
                println!("  Number:  {}", account.account_number);
            }
            println!("  ID:      {}", account.id);
        }

        AccountCommands::List { all } => {
            let service = ledger.accounts();
            let accounts = service.list(all)?;
            let totals = service.total_balances_by_currency()?;
            print!("{}", format_account_list(&accounts, &totals));
            if accounts.is_empty() {
                println!();
            }
        }

        AccountCommands::Show { account } => {
            let found = ledger.accounts().require(&account)?;
            let count = ledger.operations().list_for_account(found.id)?.len();
            print!("{}", format_account_details(&found, count));
        }

        AccountCommands::Rename { account, name } => {
            let service = ledger.accounts();
            let found = service.require(&account)?;
            let renamed = service.rename(found.id, &name)?;
            println!("Renamed account '{}' to '{}'", found.name, renamed.name);
        }

        AccountCommands::Activate { account } => {
            let service = ledger.accounts();
            let found = service.require(&account)?;
            service.activate(found.id)?;
            println!("Activated account: {}", found.name);
        }

        AccountCommands::Deactivate { account } => {
            let service = ledger.accounts();
            let found = service.require(&account)?;
            service.deactivate(found.id)?;
            println!("Deactivated account: {}", found.name);
        }

        AccountCommands::Delete { account } => {
            let service = ledger.accounts();
            let found = service.require(&account)?;
            let (deleted, operations) = service.delete(found.id)?;
            println!(
                "Deleted account: {} ({} operation(s) removed)",
                deleted.name, operations
            );
        }
    }

    Ok(())
}
