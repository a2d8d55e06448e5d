//! Ledger facade
//!
//! Builds commands, wraps them in the configured pipeline layers and runs them
//! through one undo/redo history. Everything the CLI and the interactive shell
//! do to the ledger goes through here; queries go to the services it hands
//! out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::commands::{
    AddOperation, BaseCommand, Command, CommandHistory, CommandOutput, CreateAccount,
    CreateCategory, Transfer, TransferReceipt,
};
use crate::config::{LedgerPaths, Settings};
use crate::context::LedgerContext;
use crate::error::LedgerResult;
use crate::journal::CommandJournal;
use crate::models::{
    Account, AccountId, Category, CategoryId, CategoryType, Money, Operation, OperationType,
};
use crate::pipeline::{decorate, Decorations, PerformanceStats};
use crate::services::{
    AccountService, AnalyticsService, CategoryService, OperationService, ReconciliationService,
};
use crate::storage::init::default_categories;
use crate::storage::{CacheStats, Storage};

/// Income category quick deposits are booked under
pub const DEPOSIT_CATEGORY: &str = "Deposit";

/// Expense category quick withdrawals are booked under
pub const WITHDRAWAL_CATEGORY: &str = "Withdrawal";

pub struct Ledger {
    ctx: LedgerContext,
    /// Set when the ledger is backed by files on disk
    storage: Option<Arc<Storage>>,
    history: CommandHistory,
    decorations: Decorations,
    default_currency: String,
    auto_fix: bool,
}

impl Ledger {
    pub fn new(ctx: LedgerContext, decorations: Decorations, default_currency: &str) -> LedgerResult<Self> {
        // Rejects an unknown currency code up front.
        let currency = Money::zero(default_currency)?.currency().to_string();
        Ok(Self {
            ctx,
            storage: None,
            history: CommandHistory::new(),
            decorations,
            default_currency: currency,
            auto_fix: true,
        })
    }

    /// Ledger over in-memory storage with the default layers
    pub fn in_memory() -> Self {
        Self {
            ctx: LedgerContext::in_memory(),
            storage: None,
            history: CommandHistory::new(),
            decorations: Decorations::default(),
            default_currency: crate::models::DEFAULT_CURRENCY.to_string(),
            auto_fix: true,
        }
    }

    /// Open the file-backed ledger under `paths`, configured by `settings`
    pub fn open(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<Self> {
        let mut storage = Storage::new(paths.clone())?;
        if let Some(ttl) = settings.cache_ttl() {
            storage = storage.with_cache(ttl);
        }
        storage.load_all()?;
        let storage = Arc::new(storage);

        let journal = if settings.journal_enabled {
            CommandJournal::new(paths.resolve(&settings.journal_file))
        } else {
            CommandJournal::console_only()
        };

        let ctx = LedgerContext::new(
            storage.clone(),
            Arc::new(journal),
            Arc::new(PerformanceStats::new()),
        );

        let mut ledger = Self::new(ctx, settings.decorations()?, &settings.default_currency)?;
        ledger.storage = Some(storage);
        ledger.auto_fix = settings.auto_fix_after_edit;
        debug!(base = %paths.base_dir().display(), layers = %ledger.decorations, "Ledger opened");
        Ok(ledger)
    }

    /// Write all collections to disk; a no-op for in-memory ledgers
    pub fn save(&self) -> LedgerResult<()> {
        match &self.storage {
            Some(storage) => storage.save_all(),
            None => Ok(()),
        }
    }

    pub fn context(&self) -> &LedgerContext {
        &self.ctx
    }

    pub fn decorations(&self) -> Decorations {
        self.decorations
    }

    pub fn set_decorations(&mut self, decorations: Decorations) {
        self.decorations = decorations;
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// Decorate `command` and execute it through the history
    pub fn submit(&mut self, command: Box<dyn Command>) -> LedgerResult<CommandOutput> {
        let command = decorate(command, self.decorations);
        self.history.execute(command, &self.ctx)
    }

    pub fn create_account(
        &mut self,
        name: &str,
        initial_balance: Money,
        account_number: &str,
    ) -> LedgerResult<Account> {
        self.submit(BaseCommand::boxed(CreateAccount::new(
            name,
            initial_balance,
            account_number,
        )))?
        .extract("an account", CommandOutput::into_account)
    }

    pub fn create_category(
        &mut self,
        category_type: CategoryType,
        name: &str,
        description: &str,
    ) -> LedgerResult<Category> {
        self.submit(BaseCommand::boxed(CreateCategory::new(
            category_type,
            name,
            description,
        )))?
        .extract("a category", CommandOutput::into_category)
    }

    pub fn add_operation(
        &mut self,
        operation_type: OperationType,
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: &str,
        date: DateTime<Utc>,
    ) -> LedgerResult<Operation> {
        self.submit(BaseCommand::boxed(AddOperation::new(
            operation_type,
            account_id,
            amount,
            category_id,
            description,
            date,
        )))?
        .extract("an operation", CommandOutput::into_operation)
    }

    pub fn add_income(
        &mut self,
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: &str,
    ) -> LedgerResult<Operation> {
        self.add_operation(
            OperationType::Income,
            account_id,
            amount,
            category_id,
            description,
            Utc::now(),
        )
    }

    pub fn add_expense(
        &mut self,
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: &str,
    ) -> LedgerResult<Operation> {
        self.add_operation(
            OperationType::Expense,
            account_id,
            amount,
            category_id,
            description,
            Utc::now(),
        )
    }

    /// Income under the "Deposit" category, created on first use
    ///
    /// The category is created inside the command, so undoing the first
    /// deposit removes it again.
    pub fn deposit(&mut self, account_id: AccountId, amount: Money, description: &str) -> LedgerResult<Operation> {
        self.submit(BaseCommand::boxed(AddOperation::under_system_category(
            OperationType::Income,
            account_id,
            amount,
            DEPOSIT_CATEGORY,
            "Quick deposits",
            description,
        )))?
        .extract("an operation", CommandOutput::into_operation)
    }

    /// Expense under the "Withdrawal" category, created on first use
    pub fn withdraw(&mut self, account_id: AccountId, amount: Money, description: &str) -> LedgerResult<Operation> {
        self.submit(BaseCommand::boxed(AddOperation::under_system_category(
            OperationType::Expense,
            account_id,
            amount,
            WITHDRAWAL_CATEGORY,
            "Quick withdrawals",
            description,
        )))?
        .extract("an operation", CommandOutput::into_operation)
    }

    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Money,
        description: Option<&str>,
    ) -> LedgerResult<TransferReceipt> {
        let mut transfer = Transfer::new(from, to, amount);
        if let Some(description) = description {
            transfer = transfer.with_description(description);
        }
        self.submit(BaseCommand::boxed(transfer))?
            .extract("a transfer", CommandOutput::into_transfer)
    }

    /// Undo the last executed command, returning its name
    pub fn undo(&mut self) -> LedgerResult<Option<String>> {
        let undone = self.history.undo(&self.ctx)?;
        if let Some(name) = &undone {
            info!(command = %name, "Undone");
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> LedgerResult<Option<String>> {
        let redone = self.history.redo(&self.ctx)?;
        if let Some(name) = &redone {
            info!(command = %name, "Redone");
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Recorded command names, oldest first, with the cursor position
    pub fn history_names(&self) -> Vec<String> {
        self.history.history_names()
    }

    pub fn history_cursor(&self) -> usize {
        self.history.cursor()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Create the starter categories that do not exist yet
    ///
    /// Each one is an undoable command. Returns the categories created.
    pub fn create_default_categories(&mut self) -> LedgerResult<Vec<Category>> {
        let mut created = Vec::new();
        for (category_type, name, description) in default_categories() {
            if self
                .ctx
                .categories()
                .get_by_name_and_type(name, category_type)?
                .is_some()
            {
                continue;
            }
            created.push(self.create_category(category_type, name, description)?);
        }
        Ok(created)
    }

    pub fn performance_report(&self) -> String {
        self.ctx.stats().report()
    }

    /// Read cache counters, when the ledger was opened with caching on
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.storage.as_ref().and_then(|storage| storage.cache_stats())
    }

    pub fn reset_statistics(&self) {
        self.ctx.stats().reset();
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self.ctx.store())
    }

    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService::new(self.ctx.store())
    }

    pub fn operations(&self) -> OperationService<'_> {
        OperationService::new(self.ctx.store()).with_auto_fix(self.auto_fix)
    }

    pub fn reconciliation(&self) -> ReconciliationService<'_> {
        ReconciliationService::new(self.ctx.store())
    }

    pub fn analytics(&self) -> AnalyticsService<'_> {
        AnalyticsService::new(self.ctx.store())
    }

    /// Parse `text` as an amount in the default currency
    pub fn money(&self, text: &str) -> LedgerResult<Money> {
        Money::parse(text, &self.default_currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::storage::init::{DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn rub(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, "RUB").unwrap()
    }

    fn balance(ledger: &Ledger, id: AccountId) -> Money {
        ledger.accounts().get(id).unwrap().unwrap().balance
    }

    #[test]
    fn test_income_undo_redo() {
        let mut ledger = Ledger::in_memory();
        let account = ledger.create_account("A", rub(dec!(0)), "").unwrap();
        let salary = ledger
            .create_category(CategoryType::Income, "Salary", "")
            .unwrap();

        ledger
            .add_income(account.id, rub(dec!(100)), salary.id, "pay")
            .unwrap();
        assert_eq!(balance(&ledger, account.id), rub(dec!(100)));

        assert_eq!(ledger.undo().unwrap().as_deref(), Some("Add income: 100.00 RUB"));
        assert_eq!(balance(&ledger, account.id), rub(dec!(0)));
        assert!(ledger.can_redo());

        ledger.redo().unwrap();
        assert_eq!(balance(&ledger, account.id), rub(dec!(100)));
        assert_eq!(ledger.operations().list_for_account(account.id).unwrap().len(), 1);
    }

    #[test]
    fn test_deposit_and_withdraw_create_categories_once() {
        let mut ledger = Ledger::in_memory();
        let account = ledger.create_account("Cash", rub(dec!(0)), "").unwrap();

        ledger.deposit(account.id, rub(dec!(80)), "").unwrap();
        ledger.deposit(account.id, rub(dec!(20)), "").unwrap();
        ledger.withdraw(account.id, rub(dec!(30)), "coffee").unwrap();

        assert_eq!(balance(&ledger, account.id), rub(dec!(70)));
        let categories = ledger.categories().list().unwrap();
        assert_eq!(categories.len(), 2);
        assert!(ledger
            .categories()
            .find_of_type(DEPOSIT_CATEGORY, CategoryType::Income)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_transfer_and_reconcile() {
        let mut ledger = Ledger::in_memory();
        let card = ledger.create_account("Card", rub(dec!(500)), "").unwrap();
        let cash = ledger.create_account("Cash", rub(dec!(0)), "").unwrap();

        let receipt = ledger
            .transfer(card.id, cash.id, rub(dec!(120)), Some("ATM"))
            .unwrap();
        assert_eq!(receipt.withdrawal.description, "ATM");
        assert_eq!(balance(&ledger, cash.id), rub(dec!(120)));

        let report = ledger.reconciliation().check_all_balances().unwrap();
        assert!(report.iter().all(|b| !b.has_discrepancy));
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut ledger = Ledger::in_memory();
        let account = ledger.create_account("A", rub(dec!(10)), "").unwrap();

        let err = ledger
            .withdraw(account.id, rub(dec!(50)), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(ledger.history_names(), vec!["Create account: A".to_string()]);
        assert_eq!(balance(&ledger, account.id), rub(dec!(10)));
        assert!(ledger
            .categories()
            .find_of_type(WITHDRAWAL_CATEGORY, CategoryType::Expense)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_undo_twice_then_redo_twice_restores_session() {
        let mut ledger = Ledger::in_memory();
        let account = ledger.create_account("A", rub(dec!(0)), "").unwrap();
        ledger.deposit(account.id, rub(dec!(100)), "").unwrap();

        ledger.undo().unwrap();
        ledger.undo().unwrap();
        assert!(ledger.accounts().get(account.id).unwrap().is_none());
        assert!(ledger.categories().list().unwrap().is_empty());

        assert!(ledger.redo().unwrap().is_some());
        assert!(ledger.redo().unwrap().is_some());
        assert_eq!(balance(&ledger, account.id), rub(dec!(100)));
        assert!(!ledger.can_redo());
        assert!(!ledger
            .reconciliation()
            .check_account_balance(account.id)
            .unwrap()
            .has_discrepancy);
    }

    #[test]
    fn test_redo_chain_through_created_category_and_transfer() {
        let mut ledger = Ledger::in_memory();
        let card = ledger.create_account("Card", rub(dec!(300)), "").unwrap();
        let cash = ledger.create_account("Cash", rub(dec!(0)), "").unwrap();
        let food = ledger
            .create_category(CategoryType::Expense, "Food", "")
            .unwrap();
        ledger.transfer(card.id, cash.id, rub(dec!(100)), None).unwrap();
        ledger
            .add_expense(cash.id, rub(dec!(40)), food.id, "lunch")
            .unwrap();

        for _ in 0..5 {
            ledger.undo().unwrap();
        }
        assert!(ledger.accounts().list(true).unwrap().is_empty());

        for _ in 0..5 {
            ledger.redo().unwrap();
        }
        assert_eq!(balance(&ledger, card.id), rub(dec!(200)));
        assert_eq!(balance(&ledger, cash.id), rub(dec!(60)));
        assert_eq!(ledger.operations().list_for_category(food.id).unwrap().len(), 1);
    }

    #[test]
    fn test_default_categories_skip_existing() {
        let mut ledger = Ledger::in_memory();
        ledger
            .create_category(CategoryType::Expense, "Food", "")
            .unwrap();

        let created = ledger.create_default_categories().unwrap();
        let total = DEFAULT_INCOME_CATEGORIES.len() + DEFAULT_EXPENSE_CATEGORIES.len();
        assert_eq!(created.len(), total - 1);
        assert_eq!(ledger.categories().list().unwrap().len(), total);
        assert!(ledger.create_default_categories().unwrap().is_empty());
    }

    #[test]
    fn test_statistics_follow_decorations() {
        let mut ledger = Ledger::in_memory();
        ledger.create_account("Timed", rub(dec!(0)), "").unwrap();
        assert!(ledger.performance_report().contains("Create account"));
        assert!(!ledger.performance_report().contains("Timed"));

        ledger.reset_statistics();
        ledger.set_decorations(Decorations::NONE);
        ledger.create_account("Untimed", rub(dec!(0)), "").unwrap();
        assert!(ledger.context().stats().is_empty());
    }

    #[test]
    fn test_open_persists_between_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings::default();

        let mut ledger = Ledger::open(&paths, &settings).unwrap();
        let account = ledger.create_account("Saved", rub(dec!(42)), "").unwrap();
        ledger.save().unwrap();

        let reopened = Ledger::open(&paths, &settings).unwrap();
        assert_eq!(balance(&reopened, account.id), rub(dec!(42)));
        assert!(!reopened.can_undo());
        assert!(paths.journal_file().exists());
    }

    #[test]
    fn test_open_with_caching_serves_repeat_lookups() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut settings = Settings::default();
        settings.use_caching = true;
        let mut ledger = Ledger::open(&paths, &settings).unwrap();
        let account = ledger.create_account("Cached", rub(dec!(42)), "").unwrap();
        ledger.save().unwrap();

        let reopened = Ledger::open(&paths, &settings).unwrap();
        assert_eq!(reopened.cache_stats().unwrap().hits, 0);
        assert_eq!(balance(&reopened, account.id), rub(dec!(42)));
        assert_eq!(balance(&reopened, account.id), rub(dec!(42)));

        let stats = reopened.cache_stats().unwrap();
        assert!(stats.misses >= 1);
        assert!(stats.hits >= 1);
        assert!(Ledger::in_memory().cache_stats().is_none());
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let err = Ledger::new(LedgerContext::in_memory(), Decorations::NONE, "XYZ1")
            .err()
            .unwrap();
        assert!(err.is_validation());
    }

    #[test]
    fn test_statistics_aggregate_by_command_kind() {
        let mut ledger = Ledger::in_memory();
        let account = ledger.create_account("A", rub(dec!(0)), "").unwrap();
        ledger.deposit(account.id, rub(dec!(100)), "").unwrap();
        ledger.deposit(account.id, rub(dec!(5)), "").unwrap();
        ledger.undo().unwrap();

        let stats = ledger.context().stats();
        assert_eq!(stats.get("Add income").unwrap().count, 2);
        assert_eq!(stats.get("Add income (undo)").unwrap().count, 1);
        assert!(stats.get("Add income: 100.00 RUB").is_none());
    }
}
