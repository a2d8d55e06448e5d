//! Analytics service
//!
//! Income and expense totals over a date range, broken down by category,
//! plus the savings rate and monthly averages derived from them.
//! Transfers between own accounts and opening balances move money without
//! earning or spending it, so they are left out of period figures.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::commands::account::OPENING_BALANCE_CATEGORY;
use crate::commands::TRANSFER_CATEGORY;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, CategoryId, CategoryType, DateRange, Money, Operation, OperationType,
};
use crate::storage::UnitOfWork;

/// Months a yearly total is spread over for monthly averages
const MONTHS_PER_YEAR: u32 = 12;

/// Totals of one category over a period
#[derive(Debug, Clone)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub category_name: String,
    pub operation_type: OperationType,
    pub total: Money,
    pub count: usize,
    /// Share of the income or expense total of the period
    pub percentage: f64,
}

/// Income and expense over a date range, in one currency
#[derive(Debug, Clone)]
pub struct PeriodAnalytics {
    pub range: DateRange,
    pub currency: String,
    pub total_income: Money,
    pub total_expense: Money,
    pub income_count: usize,
    pub expense_count: usize,
    /// Largest total first within each type, income before expense
    pub by_category: Vec<CategoryTotal>,
}

impl PeriodAnalytics {
    /// Income minus expense
    pub fn net_income(&self) -> LedgerResult<Money> {
        self.total_income.checked_sub(&self.total_expense)
    }

    pub fn operation_count(&self) -> usize {
        self.income_count + self.expense_count
    }

    /// Net income as a percentage of income; zero when nothing was earned
    pub fn savings_rate(&self) -> LedgerResult<f64> {
        Ok(percentage(&self.net_income()?, &self.total_income))
    }

    /// Category totals of one type, largest first
    pub fn categories_of(&self, operation_type: OperationType) -> Vec<&CategoryTotal> {
        self.by_category
            .iter()
            .filter(|c| c.operation_type == operation_type)
            .collect()
    }
}

/// Activity of one account over a period
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    pub income: Money,
    pub expense: Money,
    pub operation_count: usize,
}

impl AccountSummary {
    pub fn net_change(&self) -> LedgerResult<Money> {
        self.income.checked_sub(&self.expense)
    }
}

/// Service for period analytics
pub struct AnalyticsService<'a> {
    store: &'a dyn UnitOfWork,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(store: &'a dyn UnitOfWork) -> Self {
        Self { store }
    }

    /// Totals of the operations in `range` held in `currency`
    pub fn period_analytics(&self, range: &DateRange, currency: &str) -> LedgerResult<PeriodAnalytics> {
        let zero = Money::zero(currency)?;
        let excluded = self.movement_categories()?;
        let names: HashMap<CategoryId, String> = self
            .store
            .categories()
            .get_all()?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let operations: Vec<Operation> = self
            .store
            .operations()
            .get_by_date_range(range)?
            .into_iter()
            .filter(|op| op.amount.currency() == zero.currency())
            .filter(|op| !excluded.contains(&op.category_id))
            .collect();

        let mut total_income = zero.clone();
        let mut total_expense = zero.clone();
        let mut income_count = 0;
        let mut expense_count = 0;
        let mut per_category: HashMap<(CategoryId, OperationType), (Money, usize)> = HashMap::new();

        for op in &operations {
            match op.operation_type {
                OperationType::Income => {
                    total_income = total_income.checked_add(&op.amount)?;
                    income_count += 1;
                }
                OperationType::Expense => {
                    total_expense = total_expense.checked_add(&op.amount)?;
                    expense_count += 1;
                }
            }

            let entry = per_category
                .entry((op.category_id, op.operation_type))
                .or_insert_with(|| (zero.clone(), 0));
            entry.0 = entry.0.checked_add(&op.amount)?;
            entry.1 += 1;
        }

        let mut by_category: Vec<CategoryTotal> = per_category
            .into_iter()
            .map(|((category_id, operation_type), (total, count))| {
                let type_total = match operation_type {
                    OperationType::Income => &total_income,
                    OperationType::Expense => &total_expense,
                };
                CategoryTotal {
                    category_id,
                    category_name: names
                        .get(&category_id)
                        .cloned()
                        .unwrap_or_else(|| "(deleted category)".to_string()),
                    operation_type,
                    percentage: percentage(&total, type_total),
                    total,
                    count,
                }
            })
            .collect();

        by_category.sort_by(|a, b| {
            type_rank(a.operation_type)
                .cmp(&type_rank(b.operation_type))
                .then(b.total.amount().cmp(&a.total.amount()))
                .then(a.category_name.cmp(&b.category_name))
        });

        Ok(PeriodAnalytics {
            range: *range,
            currency: zero.currency().to_string(),
            total_income,
            total_expense,
            income_count,
            expense_count,
            by_category,
        })
    }

    /// The `limit` largest categories of one type
    pub fn top_categories(
        &self,
        range: &DateRange,
        currency: &str,
        category_type: CategoryType,
        limit: usize,
    ) -> LedgerResult<Vec<CategoryTotal>> {
        Ok(self
            .period_analytics(range, currency)?
            .by_category
            .into_iter()
            .filter(|c| c.operation_type == category_type)
            .take(limit)
            .collect())
    }

    /// Income of `year` spread evenly over its months
    pub fn average_monthly_income(&self, year: &DateRange, currency: &str) -> LedgerResult<Money> {
        monthly_average(&self.period_analytics(year, currency)?.total_income)
    }

    /// Expense of `year` spread evenly over its months
    pub fn average_monthly_expense(&self, year: &DateRange, currency: &str) -> LedgerResult<Money> {
        monthly_average(&self.period_analytics(year, currency)?.total_expense)
    }

    pub fn savings_rate(&self, range: &DateRange, currency: &str) -> LedgerResult<f64> {
        self.period_analytics(range, currency)?.savings_rate()
    }

    /// Income and expense of one account in `range`, transfers included
    pub fn account_summary(&self, account_id: AccountId, range: &DateRange) -> LedgerResult<AccountSummary> {
        let account = self
            .store
            .accounts()
            .get(account_id)?
            .ok_or_else(|| LedgerError::account_not_found(account_id.to_string()))?;

        let mut income = Money::zero(account.currency())?;
        let mut expense = Money::zero(account.currency())?;
        let operations = self
            .store
            .operations()
            .find_where(|op| op.account_id == account_id && op.is_in_range(range))?;

        for op in &operations {
            match op.operation_type {
                OperationType::Income => income = income.checked_add(&op.amount)?,
                OperationType::Expense => expense = expense.checked_add(&op.amount)?,
            }
        }

        Ok(AccountSummary {
            account,
            income,
            expense,
            operation_count: operations.len(),
        })
    }

    fn movement_categories(&self) -> LedgerResult<Vec<CategoryId>> {
        let mut ids = Vec::new();
        if let Some(c) = self
            .store
            .categories()
            .get_by_name_and_type(TRANSFER_CATEGORY, CategoryType::Expense)?
        {
            ids.push(c.id);
        }
        if let Some(c) = self
            .store
            .categories()
            .get_by_name_and_type(OPENING_BALANCE_CATEGORY, CategoryType::Income)?
        {
            ids.push(c.id);
        }
        Ok(ids)
    }
}

fn type_rank(operation_type: OperationType) -> u8 {
    match operation_type {
        OperationType::Income => 0,
        OperationType::Expense => 1,
    }
}

fn monthly_average(total: &Money) -> LedgerResult<Money> {
    if total.is_zero() {
        return Money::zero(total.currency());
    }
    let average = total.divide(Decimal::from(MONTHS_PER_YEAR))?;
    Money::new(average.amount().round_dp(2), average.currency())
}

fn percentage(part: &Money, whole: &Money) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    part.amount()
        .checked_div(whole.amount())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|percent| percent.round_dp(2).to_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddOperation, BaseCommand, Command, CreateAccount, CreateCategory, Transfer};
    use crate::context::LedgerContext;
    use crate::models::Category;
    use rust_decimal_macros::dec;

    fn rub(amount: Decimal) -> Money {
        Money::new(amount, "RUB").unwrap()
    }

    fn run(ctx: &LedgerContext, body: impl crate::commands::CommandBody) -> crate::commands::CommandOutput {
        BaseCommand::new(body).execute(ctx).unwrap()
    }

    fn category(ctx: &LedgerContext, kind: CategoryType, name: &str) -> Category {
        run(ctx, CreateCategory::new(kind, name, "")).into_category().unwrap()
    }

    #[test]
    fn test_period_analytics() {
        let ctx = LedgerContext::in_memory();
        let card = run(&ctx, CreateAccount::new("Card", rub(dec!(1000)), "")).into_account().unwrap();
        let cash = run(&ctx, CreateAccount::new("Cash", rub(dec!(0)), "")).into_account().unwrap();
        let salary = category(&ctx, CategoryType::Income, "Salary");
        let food = category(&ctx, CategoryType::Expense, "Food");
        let transport = category(&ctx, CategoryType::Expense, "Transport");

        run(&ctx, AddOperation::income(card.id, rub(dec!(500)), salary.id, ""));
        run(&ctx, AddOperation::expense(card.id, rub(dec!(150)), food.id, ""));
        run(&ctx, AddOperation::expense(card.id, rub(dec!(50)), food.id, ""));
        run(&ctx, AddOperation::expense(card.id, rub(dec!(100)), transport.id, ""));
        run(&ctx, Transfer::new(card.id, cash.id, rub(dec!(200))));

        let service = AnalyticsService::new(ctx.store());
        let analytics = service.period_analytics(&DateRange::last_days(1), "RUB").unwrap();

        assert_eq!(analytics.total_income, rub(dec!(500)));
        assert_eq!(analytics.total_expense, rub(dec!(300)));
        assert_eq!(analytics.net_income().unwrap(), rub(dec!(200)));
        assert_eq!(analytics.income_count, 1);
        assert_eq!(analytics.expense_count, 3);

        let expenses = analytics.categories_of(OperationType::Expense);
        assert_eq!(expenses[0].category_name, "Food");
        assert_eq!(expenses[0].count, 2);
        assert!((expenses[0].percentage - 66.67).abs() < 0.001);
        assert_eq!(analytics.by_category[0].category_name, "Salary");
        assert!((analytics.by_category[0].percentage - 100.0).abs() < 0.001);

        let top = service
            .top_categories(&DateRange::last_days(1), "RUB", CategoryType::Expense, 1)
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].category_id, food.id);
    }

    #[test]
    fn test_savings_rate_and_monthly_averages() {
        let ctx = LedgerContext::in_memory();
        let card = run(&ctx, CreateAccount::new("Card", rub(dec!(0)), "")).into_account().unwrap();
        let salary = category(&ctx, CategoryType::Income, "Salary");
        let rent = category(&ctx, CategoryType::Expense, "Rent");
        run(&ctx, AddOperation::income(card.id, rub(dec!(500)), salary.id, ""));
        run(&ctx, AddOperation::expense(card.id, rub(dec!(300)), rent.id, ""));

        let service = AnalyticsService::new(ctx.store());
        let year = DateRange::this_year();
        assert_eq!(service.average_monthly_income(&year, "RUB").unwrap(), rub(dec!(41.67)));
        assert_eq!(service.average_monthly_expense(&year, "RUB").unwrap(), rub(dec!(25)));

        let rate = service.savings_rate(&DateRange::last_days(1), "RUB").unwrap();
        assert!((rate - 40.0).abs() < 0.001);
    }

    #[test]
    fn test_savings_rate_without_income() {
        let ctx = LedgerContext::in_memory();
        let card = run(&ctx, CreateAccount::new("Card", rub(dec!(100)), "")).into_account().unwrap();
        let rent = category(&ctx, CategoryType::Expense, "Rent");
        run(&ctx, AddOperation::expense(card.id, rub(dec!(80)), rent.id, ""));

        let service = AnalyticsService::new(ctx.store());
        let range = DateRange::last_days(1);
        assert_eq!(service.savings_rate(&range, "RUB").unwrap(), 0.0);
        assert!(service
            .average_monthly_income(&DateRange::this_year(), "RUB")
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_overspending_gives_negative_savings_rate() {
        let ctx = LedgerContext::in_memory();
        let card = run(&ctx, CreateAccount::new("Card", rub(dec!(100)), "")).into_account().unwrap();
        let salary = category(&ctx, CategoryType::Income, "Salary");
        let rent = category(&ctx, CategoryType::Expense, "Rent");
        run(&ctx, AddOperation::income(card.id, rub(dec!(100)), salary.id, ""));
        run(&ctx, AddOperation::expense(card.id, rub(dec!(150)), rent.id, ""));

        let rate = AnalyticsService::new(ctx.store())
            .savings_rate(&DateRange::last_days(1), "RUB")
            .unwrap();
        assert!((rate + 50.0).abs() < 0.001);
    }

    #[test]
    fn test_other_currencies_ignored() {
        let ctx = LedgerContext::in_memory();
        let usd = run(&ctx, CreateAccount::new("Travel", Money::zero("USD").unwrap(), "")).into_account().unwrap();
        let salary = category(&ctx, CategoryType::Income, "Salary");
        run(
            &ctx,
            AddOperation::income(usd.id, Money::new(dec!(10), "USD").unwrap(), salary.id, ""),
        );

        let analytics = AnalyticsService::new(ctx.store())
            .period_analytics(&DateRange::last_days(1), "RUB")
            .unwrap();
        assert!(analytics.total_income.is_zero());
        assert_eq!(analytics.operation_count(), 0);
        assert!(analytics.by_category.is_empty());
    }

    #[test]
    fn test_account_summary_includes_transfers() {
        let ctx = LedgerContext::in_memory();
        let card = run(&ctx, CreateAccount::new("Card", rub(dec!(100)), "")).into_account().unwrap();
        let cash = run(&ctx, CreateAccount::new("Cash", rub(dec!(0)), "")).into_account().unwrap();
        run(&ctx, Transfer::new(card.id, cash.id, rub(dec!(40))));

        let summary = AnalyticsService::new(ctx.store())
            .account_summary(card.id, &DateRange::last_days(1))
            .unwrap();
        assert_eq!(summary.income, rub(dec!(100)));
        assert_eq!(summary.expense, rub(dec!(40)));
        assert_eq!(summary.net_change().unwrap(), rub(dec!(60)));
        assert_eq!(summary.operation_count, 2);
    }
}
