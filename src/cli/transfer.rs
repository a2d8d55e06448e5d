//! CLI handlers moving money in, out and between accounts
//!
//! Quick deposits and withdrawals book under the "Deposit" and "Withdrawal"
//! categories. Transfers book a linked expense and income pair.

use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::models::Money;

/// Handle the deposit command
pub fn handle_deposit_command(
    ledger: &mut Ledger,
    account: &str,
    amount: &str,
    description: &str,
) -> LedgerResult<()> {
    let account = ledger.accounts().require(account)?;
    let amount = Money::parse(amount, account.currency())?;
    let operation = ledger.deposit(account.id, amount, description)?;
    let balance = ledger.accounts().require(&account.id.to_string())?.balance;

    println!("Deposited {} to '{}'", operation.amount, account.name);
    println!("  New balance: {}", balance);
    Ok(())
}

/// Handle the withdraw command
pub fn handle_withdraw_command(
    ledger: &mut Ledger,
    account: &str,
    amount: &str,
    description: &str,
) -> LedgerResult<()> {
    let account = ledger.accounts().require(account)?;
    let amount = Money::parse(amount, account.currency())?;
    let operation = ledger.withdraw(account.id, amount, description)?;
    let balance = ledger.accounts().require(&account.id.to_string())?.balance;

    println!("Withdrew {} from '{}'", operation.amount, account.name);
    println!("  New balance: {}", balance);
    Ok(())
}

/// Handle the transfer command
pub fn handle_transfer_command(
    ledger: &mut Ledger,
    from: &str,
    to: &str,
    amount: &str,
    description: Option<&str>,
) -> LedgerResult<()> {
    let from_account = ledger.accounts().require(from)?;
    let to_account = ledger.accounts().require(to)?;
    let amount = Money::parse(amount, from_account.currency())?;

    let receipt = ledger.transfer(from_account.id, to_account.id, amount, description)?;

    println!("Transfer completed:");
    println!("  From: {} ({})", receipt.from.name, receipt.from.balance);
    println!("  To:   {} ({})", receipt.to.name, receipt.to.balance);
    println!("  Amount: {}", receipt.withdrawal.amount);
    Ok(())
}
