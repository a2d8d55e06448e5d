//! Reconciliation report
//!
//! Stored versus calculated balances, optionally after repairing drift.

use crate::error::LedgerResult;
use crate::models::AccountId;
use crate::services::{AccountBalance, ReconciliationService};
use crate::storage::UnitOfWork;

#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    /// Balances as they were found, before any fix
    pub balances: Vec<AccountBalance>,
    /// Number of accounts whose stored balance was overwritten
    pub fixed: usize,
}

impl ReconciliationReport {
    /// Check one account or all of them, repairing drift when `fix` is set
    pub fn generate(
        store: &dyn UnitOfWork,
        account: Option<AccountId>,
        fix: bool,
    ) -> LedgerResult<Self> {
        let service = ReconciliationService::new(store);

        let balances = match account {
            Some(id) => vec![service.recalculate_balance(id, fix)?],
            None if fix => {
                let mut found = Vec::new();
                for balance in service.check_all_balances()? {
                    found.push(service.recalculate_balance(balance.account_id, true)?);
                }
                found
            }
            None => service.check_all_balances()?,
        };

        let fixed = if fix {
            balances.iter().filter(|b| b.has_discrepancy).count()
        } else {
            0
        };

        Ok(Self { balances, fixed })
    }

    pub fn discrepancy_count(&self) -> usize {
        self.balances.iter().filter(|b| b.has_discrepancy).count()
    }

    pub fn format_terminal(&self) -> LedgerResult<String> {
        if self.balances.is_empty() {
            return Ok("No accounts to reconcile.\n".to_string());
        }

        let name_width = self
            .balances
            .iter()
            .map(|b| b.account_name.chars().count())
            .max()
            .unwrap_or(7)
            .max(7);

        let mut output = String::new();
        output.push_str(&format!(
            "{:<name_width$}  {:>16}  {:>16}  {:>16}  {}\n",
            "Account",
            "Stored",
            "Calculated",
            "Difference",
            "Status",
            name_width = name_width,
        ));
        output.push_str(&format!(
            "{:-<name_width$}  {:->16}  {:->16}  {:->16}  {:-<8}\n",
            "",
            "",
            "",
            "",
            "",
            name_width = name_width,
        ));

        for balance in &self.balances {
            let status = match (balance.has_discrepancy, self.fixed > 0) {
                (false, _) => "OK",
                (true, true) => "FIXED",
                (true, false) => "MISMATCH",
            };
            output.push_str(&format!(
                "{:<name_width$}  {:>16}  {:>16}  {:>16}  {}\n",
                balance.account_name,
                balance.stored_balance.to_string(),
                balance.calculated_balance.to_string(),
                balance.difference()?.to_string(),
                status,
                name_width = name_width,
            ));
        }

        output.push('\n');
        let discrepancies = self.discrepancy_count();
        if discrepancies == 0 {
            output.push_str("All balances match their operations.\n");
        } else if self.fixed > 0 {
            output.push_str(&format!("Fixed {} account(s).\n", self.fixed));
        } else {
            output.push_str(&format!(
                "{} account(s) out of balance. Run with --fix to repair.\n",
                discrepancies
            ));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::models::Money;
    use rust_decimal_macros::dec;

    fn drifted() -> (Ledger, AccountId) {
        let mut ledger = Ledger::in_memory();
        let account = ledger
            .create_account("Card", Money::new(dec!(100), "RUB").unwrap(), "")
            .unwrap();
        ledger
            .create_account("Cash", Money::zero("RUB").unwrap(), "")
            .unwrap();

        let mut broken = ledger.accounts().get(account.id).unwrap().unwrap();
        broken
            .recalculate_balance(Money::new(dec!(90), "RUB").unwrap())
            .unwrap();
        ledger.context().accounts().update(broken).unwrap();
        (ledger, account.id)
    }

    #[test]
    fn test_reports_mismatch_without_fixing() {
        let (ledger, id) = drifted();
        let report = ReconciliationReport::generate(ledger.context().store(), None, false).unwrap();

        assert_eq!(report.discrepancy_count(), 1);
        assert_eq!(report.fixed, 0);
        let output = report.format_terminal().unwrap();
        assert!(output.contains("MISMATCH"));
        assert!(output.contains("-10.00 RUB"));
        assert!(output.contains("--fix"));
        assert_eq!(
            ledger.accounts().get(id).unwrap().unwrap().balance,
            Money::new(dec!(90), "RUB").unwrap()
        );
    }

    #[test]
    fn test_fix_repairs_balance() {
        let (ledger, id) = drifted();
        let report = ReconciliationReport::generate(ledger.context().store(), Some(id), true).unwrap();

        assert_eq!(report.fixed, 1);
        assert!(report.format_terminal().unwrap().contains("FIXED"));
        assert_eq!(
            ledger.accounts().get(id).unwrap().unwrap().balance,
            Money::new(dec!(100), "RUB").unwrap()
        );
    }

    #[test]
    fn test_consistent_ledger() {
        let ledger = Ledger::in_memory();
        assert!(ReconciliationReport::generate(ledger.context().store(), None, false)
            .unwrap()
            .format_terminal()
            .unwrap()
            .contains("No accounts to reconcile."));
    }
}
