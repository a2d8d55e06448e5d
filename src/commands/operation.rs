use chrono::{DateTime, Utc};

use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, Category, CategoryId, Money, Operation, OperationId, OperationType,
};

use super::category::{ensure_category, release_category};
use super::{CommandBody, CommandOutput};

/// Where an operation is booked
enum CategoryChoice {
    Existing(CategoryId),
    /// Found by name and created on first use
    System { name: String, description: String },
}

/// Record an income or expense on an account and apply it to the balance
///
/// Undo removes the operation and reverses its signed amount on the account.
/// Other operations recorded on the same account in the meantime are left
/// untouched. Redo books the same operation again under its original id.
pub struct AddOperation {
    operation_type: OperationType,
    account_id: AccountId,
    amount: Money,
    category: CategoryChoice,
    description: String,
    date: DateTime<Utc>,
    prepared: Option<Operation>,
    applied: Option<OperationId>,
    created_category: Option<CategoryId>,
}

impl AddOperation {
    pub fn new(
        operation_type: OperationType,
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            operation_type,
            account_id,
            amount,
            category: CategoryChoice::Existing(category_id),
            description: description.into(),
            date,
            prepared: None,
            applied: None,
            created_category: None,
        }
    }

    /// Book under the category called `category`, creating it when missing
    ///
    /// A category created this way is removed again on undo or failure.
    pub fn under_system_category(
        operation_type: OperationType,
        account_id: AccountId,
        amount: Money,
        category: impl Into<String>,
        category_description: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            operation_type,
            account_id,
            amount,
            category: CategoryChoice::System {
                name: category.into(),
                description: category_description.into(),
            },
            description: description.into(),
            date: Utc::now(),
            prepared: None,
            applied: None,
            created_category: None,
        }
    }

    pub fn income(
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            OperationType::Income,
            account_id,
            amount,
            category_id,
            description,
            Utc::now(),
        )
    }

    pub fn expense(
        account_id: AccountId,
        amount: Money,
        category_id: CategoryId,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            OperationType::Expense,
            account_id,
            amount,
            category_id,
            description,
            Utc::now(),
        )
    }

    /// Id of the recorded operation while executed
    pub fn applied(&self) -> Option<OperationId> {
        self.applied
    }

    /// The category to book under, and its id when this run created it
    fn resolve_category(
        &self,
        ctx: &LedgerContext,
    ) -> LedgerResult<(Category, Option<CategoryId>)> {
        match &self.category {
            CategoryChoice::Existing(id) => {
                let category = ctx
                    .categories()
                    .get(*id)?
                    .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;
                Ok((category, None))
            }
            CategoryChoice::System { name, description } => {
                let system = ensure_category(ctx, name, self.operation_type, description)?;
                let created = system.created.then_some(system.category.id);
                Ok((system.category, created))
            }
        }
    }

    fn book(
        &self,
        ctx: &LedgerContext,
        mut account: Account,
        category: &Category,
    ) -> LedgerResult<Operation> {
        if category.category_type != self.operation_type {
            return Err(LedgerError::DomainRule(format!(
                "Category '{}' is an {} category, not {}",
                category.name, category.category_type, self.operation_type
            )));
        }

        let operation = match &self.prepared {
            Some(prepared) => {
                let mut operation = prepared.clone();
                operation.category_id = category.id;
                operation
            }
            None => ctx.factory().create_operation(
                self.operation_type,
                account.id,
                self.amount.clone(),
                category.id,
                &self.description,
                self.date,
            )?,
        };

        match operation.operation_type {
            OperationType::Income => account.deposit(&operation.amount)?,
            OperationType::Expense => account.withdraw(&operation.amount)?,
        }

        ctx.operations().insert(operation.clone())?;
        if let Err(e) = ctx.accounts().update(account) {
            ctx.operations().delete(operation.id)?;
            return Err(e);
        }
        Ok(operation)
    }
}

impl CommandBody for AddOperation {
    fn name(&self) -> String {
        format!("{}: {}", self.kind(), self.amount)
    }

    fn kind(&self) -> &'static str {
        match self.operation_type {
            OperationType::Income => "Add income",
            OperationType::Expense => "Add expense",
        }
    }

    fn do_execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput> {
        let account = ctx
            .accounts()
            .get(self.account_id)?
            .ok_or_else(|| LedgerError::account_not_found(self.account_id.to_string()))?;

        let (category, created_category) = self.resolve_category(ctx)?;
        let operation = match self.book(ctx, account, &category) {
            Ok(operation) => operation,
            Err(e) => {
                if let Some(id) = created_category {
                    release_category(ctx, id)?;
                }
                return Err(e);
            }
        };

        self.applied = Some(operation.id);
        self.created_category = created_category;
        self.prepared = Some(operation.clone());
        Ok(CommandOutput::Operation(operation))
    }

    fn do_undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()> {
        let id = self
            .applied
            .ok_or_else(|| LedgerError::NotExecuted(self.name()))?;

        let operation = ctx
            .operations()
            .get(id)?
            .ok_or_else(|| LedgerError::operation_not_found(id.to_string()))?;
        let mut account = ctx
            .accounts()
            .get(operation.account_id)?
            .ok_or_else(|| LedgerError::account_not_found(operation.account_id.to_string()))?;

        account.revert(&operation.signed_amount())?;
        ctx.accounts().update(account)?;
        ctx.operations().delete(id)?;
        if let Some(category) = self.created_category.take() {
            release_category(ctx, category)?;
        }

        self.applied = None;
        Ok(())
    }
}
