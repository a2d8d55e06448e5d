//! Operation service
//!
//! Queries over recorded operations, in-place edits, and materialisation of
//! recurring templates. Edits that change money re-run reconciliation for
//! the affected account so the stored balance follows the operations.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::ids::single_match;
use crate::models::{
    AccountId, CategoryId, DateRange, Money, Operation, OperationId, OperationType,
    RecurrencePattern,
};
use crate::storage::UnitOfWork;

use super::reconciliation::ReconciliationService;

/// Service for operation queries and edits
pub struct OperationService<'a> {
    store: &'a dyn UnitOfWork,
    auto_fix: bool,
}

impl<'a> OperationService<'a> {
    pub fn new(store: &'a dyn UnitOfWork) -> Self {
        Self {
            store,
            auto_fix: true,
        }
    }

    /// Whether money edits correct the account balance afterwards
    pub fn with_auto_fix(mut self, auto_fix: bool) -> Self {
        self.auto_fix = auto_fix;
        self
    }

    pub fn get(&self, id: OperationId) -> LedgerResult<Option<Operation>> {
        self.store.operations().get(id)
    }

    /// Find an operation by full or short ID
    pub fn find(&self, reference: &str) -> LedgerResult<Option<Operation>> {
        single_match(self.store.operations().get_all()?, reference, |op| {
            op.id.matches(reference)
        })
    }

    pub fn require(&self, reference: &str) -> LedgerResult<Operation> {
        self.find(reference)?
            .ok_or_else(|| LedgerError::operation_not_found(reference))
    }

    pub fn list_all(&self) -> LedgerResult<Vec<Operation>> {
        self.store.operations().get_all()
    }

    pub fn list_for_account(&self, account_id: AccountId) -> LedgerResult<Vec<Operation>> {
        self.store.operations().get_by_account(account_id)
    }

    pub fn list_for_category(&self, category_id: CategoryId) -> LedgerResult<Vec<Operation>> {
        self.store.operations().get_by_category(category_id)
    }

    pub fn list_in_range(&self, range: &DateRange) -> LedgerResult<Vec<Operation>> {
        self.store.operations().get_by_date_range(range)
    }

    pub fn list_by_type(&self, operation_type: OperationType) -> LedgerResult<Vec<Operation>> {
        self.store.operations().get_by_type(operation_type)
    }

    pub fn update_amount(&self, id: OperationId, amount: Money) -> LedgerResult<Operation> {
        let mut operation = self.load(id)?;
        operation.set_amount(amount)?;
        self.store.operations().update(operation.clone())?;
        self.reconcile(operation.account_id)?;
        Ok(operation)
    }

    pub fn update_description(&self, id: OperationId, description: &str) -> LedgerResult<Operation> {
        let mut operation = self.load(id)?;
        operation.set_description(description.trim())?;
        self.store.operations().update(operation.clone())?;
        Ok(operation)
    }

    pub fn update_date(&self, id: OperationId, date: DateTime<Utc>) -> LedgerResult<Operation> {
        let mut operation = self.load(id)?;
        operation.set_date(date);
        self.store.operations().update(operation.clone())?;
        Ok(operation)
    }

    /// Move an operation to another category of the same type
    pub fn update_category(&self, id: OperationId, category_id: CategoryId) -> LedgerResult<Operation> {
        let mut operation = self.load(id)?;
        let category = self
            .store
            .categories()
            .get(category_id)?
            .ok_or_else(|| LedgerError::category_not_found(category_id.to_string()))?;
        if category.category_type != operation.operation_type {
            return Err(LedgerError::DomainRule(format!(
                "Category '{}' is an {} category, not {}",
                category.name, category.category_type, operation.operation_type
            )));
        }

        operation.set_category(category.id);
        self.store.operations().update(operation.clone())?;
        Ok(operation)
    }

    /// Mark an operation as a recurring template, or clear the mark
    pub fn set_recurring(
        &self,
        id: OperationId,
        pattern: Option<RecurrencePattern>,
    ) -> LedgerResult<Operation> {
        let mut operation = self.load(id)?;
        operation.set_recurring(pattern);
        self.store.operations().update(operation.clone())?;
        Ok(operation)
    }

    /// Delete an operation; its account is reconciled afterwards
    pub fn delete(&self, id: OperationId) -> LedgerResult<Operation> {
        let operation = self.load(id)?;
        self.store.operations().delete(id)?;
        self.reconcile(operation.account_id)?;
        Ok(operation)
    }

    /// Book every occurrence of the recurring templates due up to `as_of`
    ///
    /// Each occurrence is a separate one-off operation applied to the account
    /// balance. A template whose account refuses an occurrence (inactive,
    /// insufficient funds) stops at that occurrence and is retried on the
    /// next run.
    pub fn process_recurring(&self, as_of: DateTime<Utc>) -> LedgerResult<Vec<Operation>> {
        let mut created = Vec::new();

        for mut template in self.store.operations().get_recurring()? {
            let due = template.due_occurrences(as_of);
            if due.is_empty() {
                continue;
            }

            let mut account = self
                .store
                .accounts()
                .get(template.account_id)?
                .ok_or_else(|| LedgerError::account_not_found(template.account_id.to_string()))?;

            let mut booked = None;
            for date in due {
                let occurrence = template.clone_for_date(date);
                let applied = match occurrence.operation_type {
                    OperationType::Income => account.deposit(&occurrence.amount),
                    OperationType::Expense => account.withdraw(&occurrence.amount),
                };
                if let Err(e) = applied {
                    warn!(template = %template.id, error = %e, "Recurring occurrence skipped");
                    break;
                }

                self.store.operations().insert(occurrence.clone())?;
                self.store.accounts().update(account.clone())?;
                booked = Some(date);
                created.push(occurrence);
            }

            if let Some(last) = booked {
                template.last_occurrence = Some(last);
                self.store.operations().update(template)?;
            }
        }

        if !created.is_empty() {
            info!(count = created.len(), "Recurring operations booked");
        }
        Ok(created)
    }

    fn reconcile(&self, account_id: AccountId) -> LedgerResult<()> {
        if self.store.accounts().exists(account_id)? {
            ReconciliationService::new(self.store).recalculate_balance(account_id, self.auto_fix)?;
        }
        Ok(())
    }

    fn load(&self, id: OperationId) -> LedgerResult<Operation> {
        self.store
            .operations()
            .get(id)?
            .ok_or_else(|| LedgerError::operation_not_found(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddOperation, BaseCommand, Command, CreateAccount, CreateCategory};
    use crate::context::LedgerContext;
    use crate::models::{Account, Category, CategoryType};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn rub(amount: Decimal) -> Money {
        Money::new(amount, "RUB").unwrap()
    }

    struct Fixture {
        ctx: LedgerContext,
        account: Account,
        salary: Category,
        food: Category,
    }

    fn fixture(opening: Decimal) -> Fixture {
        let ctx = LedgerContext::in_memory();
        let account = BaseCommand::new(CreateAccount::new("Card", rub(opening), ""))
            .execute(&ctx)
            .unwrap()
            .into_account()
            .unwrap();
        let salary = BaseCommand::new(CreateCategory::new(CategoryType::Income, "Salary", ""))
            .execute(&ctx)
            .unwrap()
            .into_category()
            .unwrap();
        let food = BaseCommand::new(CreateCategory::new(CategoryType::Expense, "Food", ""))
            .execute(&ctx)
            .unwrap()
            .into_category()
            .unwrap();
        Fixture {
            ctx,
            account,
            salary,
            food,
        }
    }

    fn add(fx: &Fixture, op: AddOperation) -> Operation {
        BaseCommand::new(op)
            .execute(&fx.ctx)
            .unwrap()
            .into_operation()
            .unwrap()
    }

    fn balance(fx: &Fixture) -> Money {
        fx.ctx.accounts().get(fx.account.id).unwrap().unwrap().balance
    }

    #[test]
    fn test_amount_edit_recalculates_balance() {
        let fx = fixture(dec!(100));
        let lunch = add(&fx, AddOperation::expense(fx.account.id, rub(dec!(30)), fx.food.id, "Lunch"));
        let service = OperationService::new(fx.ctx.store());

        service.update_amount(lunch.id, rub(dec!(45))).unwrap();
        assert_eq!(balance(&fx), rub(dec!(55)));

        assert!(service.update_amount(lunch.id, rub(dec!(0))).unwrap_err().is_validation());
    }

    #[test]
    fn test_edit_without_auto_fix_leaves_drift() {
        let fx = fixture(dec!(100));
        let lunch = add(&fx, AddOperation::expense(fx.account.id, rub(dec!(30)), fx.food.id, ""));
        let service = OperationService::new(fx.ctx.store()).with_auto_fix(false);

        service.update_amount(lunch.id, rub(dec!(40))).unwrap();
        assert_eq!(balance(&fx), rub(dec!(70)));
        assert!(ReconciliationService::new(fx.ctx.store())
            .check_account_balance(fx.account.id)
            .unwrap()
            .has_discrepancy);
    }

    #[test]
    fn test_delete_recalculates_balance() {
        let fx = fixture(dec!(0));
        let pay = add(&fx, AddOperation::income(fx.account.id, rub(dec!(500)), fx.salary.id, ""));
        let service = OperationService::new(fx.ctx.store());

        service.delete(pay.id).unwrap();
        assert_eq!(balance(&fx), rub(dec!(0)));
        assert!(service.get(pay.id).unwrap().is_none());
    }

    #[test]
    fn test_update_category_checks_type() {
        let fx = fixture(dec!(100));
        let lunch = add(&fx, AddOperation::expense(fx.account.id, rub(dec!(10)), fx.food.id, ""));
        let service = OperationService::new(fx.ctx.store());

        assert!(service
            .update_category(lunch.id, fx.salary.id)
            .unwrap_err()
            .is_domain_rule());
        assert!(service
            .update_category(lunch.id, CategoryId::new())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_queries() {
        let fx = fixture(dec!(100));
        add(&fx, AddOperation::expense(fx.account.id, rub(dec!(10)), fx.food.id, ""));
        add(&fx, AddOperation::income(fx.account.id, rub(dec!(20)), fx.salary.id, ""));
        let service = OperationService::new(fx.ctx.store());

        // Opening balance, expense, income
        assert_eq!(service.list_for_account(fx.account.id).unwrap().len(), 3);
        assert_eq!(service.list_for_category(fx.food.id).unwrap().len(), 1);
        assert_eq!(service.list_by_type(OperationType::Income).unwrap().len(), 2);
        assert_eq!(service.list_in_range(&DateRange::last_days(1)).unwrap().len(), 3);
    }

    #[test]
    fn test_process_recurring_books_due_occurrences() {
        let fx = fixture(dec!(0));
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let pay = add(
            &fx,
            AddOperation::new(
                OperationType::Income,
                fx.account.id,
                rub(dec!(1000)),
                fx.salary.id,
                "Salary",
                start,
            ),
        );
        let service = OperationService::new(fx.ctx.store());
        service.set_recurring(pay.id, Some(RecurrencePattern::Monthly)).unwrap();

        let as_of = start + Duration::days(70);
        let created = service.process_recurring(as_of).unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|op| !op.is_recurring));
        assert_eq!(created[0].description, "Salary (Recurring)");
        assert_eq!(balance(&fx), rub(dec!(3000)));

        // Nothing new is due on a second run
        assert!(service.process_recurring(as_of).unwrap().is_empty());
        assert!(!ReconciliationService::new(fx.ctx.store())
            .check_account_balance(fx.account.id)
            .unwrap()
            .has_discrepancy);
    }

    #[test]
    fn test_recurring_expense_stops_when_funds_run_out() {
        let fx = fixture(dec!(250));
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let rent = add(
            &fx,
            AddOperation::new(
                OperationType::Expense,
                fx.account.id,
                rub(dec!(100)),
                fx.food.id,
                "Rent",
                start,
            ),
        );
        let service = OperationService::new(fx.ctx.store());
        service.set_recurring(rent.id, Some(RecurrencePattern::Weekly)).unwrap();

        let created = service.process_recurring(start + Duration::days(30)).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(balance(&fx), rub(dec!(50)));
    }
}
