//! Money transfer between two accounts
//!
//! Execute moves the money, then books a pair of operations under the shared
//! "Transfer" category: an expense on the source and an income on the target.
//! If any step after the withdrawal fails, both accounts are put back and no
//! operation is left behind.
//!
//! Undo reverses the movement and removes the two booked operations, so the
//! reconciled balance of either account is unaffected by a transfer that was
//! undone.

use chrono::{DateTime, Utc};

use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, CategoryId, CategoryType, Money, Operation, OperationId, OperationType,
};

use super::category::{ensure_category, release_category};
use super::{CommandBody, CommandOutput};

/// Name of the lazily created category transfers are booked under
pub const TRANSFER_CATEGORY: &str = "Transfer";

/// Both accounts after the transfer and the operations recorded for it
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub from: Account,
    pub to: Account,
    pub withdrawal: Operation,
    pub deposit: Operation,
}

pub struct Transfer {
    from: AccountId,
    to: AccountId,
    amount: Money,
    description: Option<String>,
    date: DateTime<Utc>,
    /// The booked pair, kept so a redo books the same operations
    prepared: Option<(Operation, Operation)>,
    recorded: Option<(OperationId, OperationId)>,
    created_category: Option<CategoryId>,
}

impl Transfer {
    pub fn new(from: AccountId, to: AccountId, amount: Money) -> Self {
        Self {
            from,
            to,
            amount,
            description: None,
            date: Utc::now(),
            prepared: None,
            recorded: None,
            created_category: None,
        }
    }

    /// Use `description` on the source's expense instead of the generated one
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.trim().is_empty() {
            self.description = Some(description);
        }
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    fn load(ctx: &LedgerContext, id: AccountId) -> LedgerResult<Account> {
        ctx.accounts()
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    fn build_pair(
        &self,
        ctx: &LedgerContext,
        from: &Account,
        to: &Account,
        category: CategoryId,
    ) -> LedgerResult<(Operation, Operation)> {
        if let Some((withdrawal, deposit)) = &self.prepared {
            let (mut withdrawal, mut deposit) = (withdrawal.clone(), deposit.clone());
            withdrawal.category_id = category;
            deposit.category_id = category;
            return Ok((withdrawal, deposit));
        }

        let withdrawal_note = self
            .description
            .clone()
            .unwrap_or_else(|| format!("Transfer to {}", to.name));
        let withdrawal = ctx.factory().create_operation(
            OperationType::Expense,
            from.id,
            self.amount.clone(),
            category,
            &withdrawal_note,
            self.date,
        )?;
        let deposit = ctx.factory().create_operation(
            OperationType::Income,
            to.id,
            self.amount.clone(),
            category,
            &format!("Transfer from {}", from.name),
            self.date,
        )?;
        Ok((withdrawal, deposit))
    }

    /// Record the pair, returning it with the category id if it was created
    fn book(
        &self,
        ctx: &LedgerContext,
        from: &Account,
        to: &Account,
    ) -> LedgerResult<(Operation, Operation, Option<CategoryId>)> {
        let system = ensure_category(
            ctx,
            TRANSFER_CATEGORY,
            CategoryType::Expense,
            "Money moved between accounts",
        )?;
        let created = system.created.then_some(system.category.id);

        let inserted = self
            .build_pair(ctx, from, to, system.category.id)
            .and_then(|(withdrawal, deposit)| {
                ctx.operations().insert(withdrawal.clone())?;
                if let Err(e) = ctx.operations().insert(deposit.clone()) {
                    ctx.operations().delete(withdrawal.id)?;
                    return Err(e);
                }
                Ok((withdrawal, deposit))
            });

        match inserted {
            Ok((withdrawal, deposit)) => Ok((withdrawal, deposit, created)),
            Err(e) => {
                if let Some(id) = created {
                    release_category(ctx, id)?;
                }
                Err(e)
            }
        }
    }
}

impl CommandBody for Transfer {
    fn name(&self) -> String {
        format!("{}: {}", self.kind(), self.amount)
    }

    fn kind(&self) -> &'static str {
        "Transfer"
    }

    fn do_execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput> {
        if self.from == self.to {
            return Err(LedgerError::DomainRule(
                "Cannot transfer to the same account".into(),
            ));
        }

        let mut from = Self::load(ctx, self.from)?;
        let mut to = Self::load(ctx, self.to)?;
        let from_before = from.clone();
        let to_before = to.clone();

        // Puts the source back itself when the target refuses the deposit
        from.transfer(&mut to, &self.amount)?;

        ctx.accounts().update(from.clone())?;
        if let Err(e) = ctx.accounts().update(to.clone()) {
            ctx.accounts().update(from_before)?;
            return Err(e);
        }

        let (withdrawal, deposit, created_category) = match self.book(ctx, &from, &to) {
            Ok(booked) => booked,
            Err(e) => {
                ctx.accounts().update(from_before)?;
                ctx.accounts().update(to_before)?;
                return Err(e);
            }
        };

        self.recorded = Some((withdrawal.id, deposit.id));
        self.created_category = created_category;
        self.prepared = Some((withdrawal.clone(), deposit.clone()));
        Ok(CommandOutput::Transfer(Box::new(TransferReceipt {
            from,
            to,
            withdrawal,
            deposit,
        })))
    }

    fn do_undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()> {
        let (withdrawal_id, deposit_id) = self
            .recorded
            .ok_or_else(|| LedgerError::NotExecuted(self.name()))?;

        let withdrawal = ctx
            .operations()
            .get(withdrawal_id)?
            .ok_or_else(|| LedgerError::operation_not_found(withdrawal_id.to_string()))?;
        let deposit = ctx
            .operations()
            .get(deposit_id)?
            .ok_or_else(|| LedgerError::operation_not_found(deposit_id.to_string()))?;

        let mut from = Self::load(ctx, withdrawal.account_id)?;
        let mut to = Self::load(ctx, deposit.account_id)?;
        let to_before = to.clone();

        to.revert(&deposit.signed_amount())?;
        from.revert(&withdrawal.signed_amount())?;

        ctx.accounts().update(to)?;
        if let Err(e) = ctx.accounts().update(from) {
            ctx.accounts().update(to_before)?;
            return Err(e);
        }
        ctx.operations().delete(withdrawal_id)?;
        ctx.operations().delete(deposit_id)?;
        if let Some(category) = self.created_category.take() {
            release_category(ctx, category)?;
        }

        self.recorded = None;
        Ok(())
    }
}
