//! Reconciliation service
//!
//! An account is consistent when its stored balance equals the fold of the
//! signed amounts of all operations recorded on it. This service computes
//! that fold, reports drift, and optionally overwrites the stored balance
//! with the computed one.

use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, Money};
use crate::storage::UnitOfWork;

/// Stored versus computed balance of one account
#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub account_name: String,
    pub stored_balance: Money,
    /// Sum of the signed amounts of the account's operations
    pub calculated_balance: Money,
    pub has_discrepancy: bool,
}

impl AccountBalance {
    /// Stored minus calculated
    pub fn difference(&self) -> LedgerResult<Money> {
        self.stored_balance.checked_sub(&self.calculated_balance)
    }
}

/// Service for balance reconciliation
pub struct ReconciliationService<'a> {
    store: &'a dyn UnitOfWork,
}

impl<'a> ReconciliationService<'a> {
    pub fn new(store: &'a dyn UnitOfWork) -> Self {
        Self { store }
    }

    /// Compare the stored balance of an account with its operations
    ///
    /// Never changes anything.
    pub fn check_account_balance(&self, account_id: AccountId) -> LedgerResult<AccountBalance> {
        let account = self
            .store
            .accounts()
            .get(account_id)?
            .ok_or_else(|| LedgerError::account_not_found(account_id.to_string()))?;
        self.check(&account)
    }

    /// Check an account and, with `auto_fix`, repair a discrepancy
    ///
    /// The returned snapshot describes the account as it was found.
    pub fn recalculate_balance(
        &self,
        account_id: AccountId,
        auto_fix: bool,
    ) -> LedgerResult<AccountBalance> {
        let report = self.check_account_balance(account_id)?;

        if report.has_discrepancy && auto_fix {
            let mut account = self
                .store
                .accounts()
                .get(account_id)?
                .ok_or_else(|| LedgerError::account_not_found(account_id.to_string()))?;
            account.recalculate_balance(report.calculated_balance.clone())?;
            self.store.accounts().update(account)?;

            info!(
                account = %report.account_name,
                stored = %report.stored_balance,
                calculated = %report.calculated_balance,
                "Balance corrected"
            );
        }

        Ok(report)
    }

    /// Check every account, in account list order
    pub fn check_all_balances(&self) -> LedgerResult<Vec<AccountBalance>> {
        self.store
            .accounts()
            .get_all()?
            .iter()
            .map(|account| self.check(account))
            .collect()
    }

    /// Only the accounts whose stored balance has drifted
    pub fn discrepancies(&self) -> LedgerResult<Vec<AccountBalance>> {
        Ok(self
            .check_all_balances()?
            .into_iter()
            .filter(|report| report.has_discrepancy)
            .collect())
    }

    /// Repair every drifted account; returns how many were fixed
    pub fn fix_all_discrepancies(&self) -> LedgerResult<usize> {
        let drifted = self.discrepancies()?;
        for report in &drifted {
            self.recalculate_balance(report.account_id, true)?;
        }
        Ok(drifted.len())
    }

    /// Sum of the signed amounts of an account's operations
    pub fn calculated_balance(&self, account: &Account) -> LedgerResult<Money> {
        let signed: Vec<Money> = self
            .store
            .operations()
            .get_by_account(account.id)?
            .iter()
            .map(|op| op.signed_amount())
            .collect();
        Money::sum(account.currency(), &signed)
    }

    fn check(&self, account: &Account) -> LedgerResult<AccountBalance> {
        let calculated_balance = self.calculated_balance(account)?;
        let has_discrepancy = account.balance != calculated_balance;
        if has_discrepancy {
            warn!(
                account = %account.name,
                stored = %account.balance,
                calculated = %calculated_balance,
                "Balance discrepancy"
            );
        }

        Ok(AccountBalance {
            account_id: account.id,
            account_name: account.name.clone(),
            stored_balance: account.balance.clone(),
            calculated_balance,
            has_discrepancy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{
        AddOperation, BaseCommand, CommandHistory, CreateAccount, CreateCategory, Transfer,
    };
    use crate::context::LedgerContext;
    use crate::models::{Category, CategoryType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn rub(amount: Decimal) -> Money {
        Money::new(amount, "RUB").unwrap()
    }

    fn account(history: &mut CommandHistory, ctx: &LedgerContext, name: &str, amount: Decimal) -> Account {
        history
            .execute(BaseCommand::boxed(CreateAccount::new(name, rub(amount), "")), ctx)
            .unwrap()
            .into_account()
            .unwrap()
    }

    fn category(history: &mut CommandHistory, ctx: &LedgerContext, kind: CategoryType, name: &str) -> Category {
        history
            .execute(BaseCommand::boxed(CreateCategory::new(kind, name, "")), ctx)
            .unwrap()
            .into_category()
            .unwrap()
    }

    #[test]
    fn test_consistent_after_mixed_commands_and_undo() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        let x = account(&mut history, &ctx, "X", dec!(100));
        let y = account(&mut history, &ctx, "Y", dec!(0));
        let salary = category(&mut history, &ctx, CategoryType::Income, "Salary");
        let food = category(&mut history, &ctx, CategoryType::Expense, "Food");

        history
            .execute(BaseCommand::boxed(AddOperation::income(x.id, rub(dec!(250)), salary.id, "")), &ctx)
            .unwrap();
        history
            .execute(BaseCommand::boxed(Transfer::new(x.id, y.id, rub(dec!(120)))), &ctx)
            .unwrap();
        history
            .execute(BaseCommand::boxed(AddOperation::expense(y.id, rub(dec!(20)), food.id, "")), &ctx)
            .unwrap();
        history
            .execute(BaseCommand::boxed(AddOperation::expense(x.id, rub(dec!(30)), food.id, "")), &ctx)
            .unwrap();

        let service = ReconciliationService::new(ctx.store());
        assert!(service.discrepancies().unwrap().is_empty());

        history.undo(&ctx).unwrap();
        history.undo(&ctx).unwrap();
        history.undo(&ctx).unwrap();
        assert!(service.discrepancies().unwrap().is_empty());

        let report = service.check_account_balance(x.id).unwrap();
        assert_eq!(report.stored_balance, rub(dec!(350)));
        assert_eq!(report.calculated_balance, rub(dec!(350)));
    }

    #[test]
    fn test_drift_detected_and_fixed() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        let x = account(&mut history, &ctx, "X", dec!(100));

        let mut drifted = ctx.accounts().get(x.id).unwrap().unwrap();
        drifted.recalculate_balance(rub(dec!(90))).unwrap();
        ctx.accounts().update(drifted).unwrap();

        let service = ReconciliationService::new(ctx.store());
        let report = service.recalculate_balance(x.id, false).unwrap();
        assert!(report.has_discrepancy);
        assert_eq!(report.difference().unwrap(), rub(dec!(-10)));
        assert_eq!(ctx.accounts().get(x.id).unwrap().unwrap().balance, rub(dec!(90)));

        assert_eq!(service.fix_all_discrepancies().unwrap(), 1);
        assert_eq!(ctx.accounts().get(x.id).unwrap().unwrap().balance, rub(dec!(100)));
        assert!(!service.check_account_balance(x.id).unwrap().has_discrepancy);
    }

    #[test]
    fn test_unknown_account_is_not_found() {
        let ctx = LedgerContext::in_memory();
        let service = ReconciliationService::new(ctx.store());
        assert!(service
            .check_account_balance(AccountId::new())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_check_does_not_mutate() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        let x = account(&mut history, &ctx, "X", dec!(10));
        let mut drifted = ctx.accounts().get(x.id).unwrap().unwrap();
        drifted.recalculate_balance(rub(dec!(0))).unwrap();
        ctx.accounts().update(drifted).unwrap();

        let service = ReconciliationService::new(ctx.store());
        assert_eq!(service.check_all_balances().unwrap().len(), 1);
        assert_eq!(ctx.accounts().get(x.id).unwrap().unwrap().balance, rub(dec!(0)));
    }
}
