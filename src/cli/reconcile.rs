//! CLI command handler for balance reconciliation

use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::reports::ReconciliationReport;

/// Handle the reconcile command
///
/// Checks one account or every account; `fix` overwrites drifted balances
/// with the sum of their operations.
pub fn handle_reconcile_command(ledger: &Ledger, account: Option<&str>, fix: bool) -> LedgerResult<()> {
    let account = match account {
        Some(reference) => Some(ledger.accounts().require(reference)?.id),
        None => None,
    };

    let report = ReconciliationReport::generate(ledger.context().store(), account, fix)?;
    print!("{}", report.format_terminal()?);
    Ok(())
}
