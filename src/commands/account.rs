//! Account creation command
//!
//! A non-zero opening balance is recorded as an income operation under the
//! "Opening Balance" category, so the stored balance always equals the sum of
//! the account's operations from the moment it exists.

use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, CategoryId, CategoryType, Money, Operation, OperationType};

use super::category::{ensure_category, release_category};
use super::{CommandBody, CommandOutput};

pub const OPENING_BALANCE_CATEGORY: &str = "Opening Balance";

/// Create an account; undo deletes it along with its opening entry
///
/// Redo inserts the account and entry built by the first execute, keeping
/// their ids.
pub struct CreateAccount {
    name: String,
    initial_balance: Money,
    account_number: String,
    account: Option<Account>,
    opening: Option<Operation>,
    created: Option<AccountId>,
    opening_category: Option<CategoryId>,
}

impl CreateAccount {
    pub fn new(
        name: impl Into<String>,
        initial_balance: Money,
        account_number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            initial_balance,
            account_number: account_number.into(),
            account: None,
            opening: None,
            created: None,
            opening_category: None,
        }
    }

    fn opening_entry(
        &self,
        ctx: &LedgerContext,
        account: &Account,
        category: CategoryId,
    ) -> LedgerResult<Operation> {
        match &self.opening {
            Some(operation) => {
                let mut operation = operation.clone();
                operation.category_id = category;
                Ok(operation)
            }
            None => ctx.factory().create_operation(
                OperationType::Income,
                account.id,
                account.balance.clone(),
                category,
                "Opening balance",
                account.created_at,
            ),
        }
    }

    fn store(ctx: &LedgerContext, account: &Account, opening: Option<&Operation>) -> LedgerResult<()> {
        ctx.accounts().insert(account.clone())?;
        if let Some(operation) = opening {
            if let Err(e) = ctx.operations().insert(operation.clone()) {
                ctx.accounts().delete(account.id)?;
                return Err(e);
            }
        }
        Ok(())
    }
}

impl CommandBody for CreateAccount {
    fn name(&self) -> String {
        format!("Create account: {}", self.name)
    }

    fn kind(&self) -> &'static str {
        "Create account"
    }

    fn do_execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput> {
        let account = match &self.account {
            Some(account) => account.clone(),
            None => ctx.factory().create_bank_account(
                &self.name,
                self.initial_balance.clone(),
                &self.account_number,
            )?,
        };

        if ctx.accounts().get_by_name(&account.name)?.is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Account",
                identifier: account.name,
            });
        }

        let mut opening_category = None;
        let opening = if account.balance.is_positive() {
            let system = ensure_category(
                ctx,
                OPENING_BALANCE_CATEGORY,
                CategoryType::Income,
                "Balance an account started with",
            )?;
            if system.created {
                opening_category = Some(system.category.id);
            }
            Some(self.opening_entry(ctx, &account, system.category.id))
        } else {
            None
        };

        let stored = opening.transpose().and_then(|opening| {
            Self::store(ctx, &account, opening.as_ref())?;
            Ok(opening)
        });
        let opening = match stored {
            Ok(opening) => opening,
            Err(e) => {
                if let Some(id) = opening_category {
                    release_category(ctx, id)?;
                }
                return Err(e);
            }
        };

        self.created = Some(account.id);
        self.opening_category = opening_category;
        self.opening = opening;
        self.account = Some(account.clone());
        Ok(CommandOutput::Account(account))
    }

    fn do_undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()> {
        let id = self
            .created
            .ok_or_else(|| LedgerError::NotExecuted(self.name()))?;
        let opening = self.opening.as_ref().map(|op| op.id);

        let others = ctx
            .operations()
            .find_where(|op| op.account_id == id && Some(op.id) != opening)?
            .len();
        if others > 0 {
            return Err(LedgerError::DomainRule(format!(
                "Account '{}' still has {} operation(s)",
                self.name, others
            )));
        }

        ctx.accounts()
            .delete(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;
        if let Some(opening) = opening {
            ctx.operations().delete(opening)?;
        }
        if let Some(category) = self.opening_category.take() {
            release_category(ctx, category)?;
        }
        self.created = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{BaseCommand, Command};
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_account_with_opening_balance() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(CreateAccount::new(
            "Main card",
            Money::new(dec!(1000), "RUB").unwrap(),
            "40817",
        ));

        let account = cmd.execute(&ctx).unwrap().into_account().unwrap();
        assert_eq!(cmd.name(), "Create account: Main card");
        assert_eq!(account.balance, Money::new(dec!(1000), "RUB").unwrap());

        let ops = ctx.operations().get_by_account(account.id).unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_income());
        assert!(ctx
            .categories()
            .get_by_name(OPENING_BALANCE_CATEGORY)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_zero_balance_has_no_opening_entry() {
        let ctx = LedgerContext::in_memory();
        let account = BaseCommand::new(CreateAccount::new("Empty", Money::zero("RUB").unwrap(), ""))
            .execute(&ctx)
            .unwrap()
            .into_account()
            .unwrap();
        assert!(ctx.operations().get_by_account(account.id).unwrap().is_empty());
        assert_eq!(ctx.categories().count().unwrap(), 0);
    }

    #[test]
    fn test_undo_removes_account_and_opening_entry() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(CreateAccount::new(
            "Cash",
            Money::new(dec!(50), "RUB").unwrap(),
            "",
        ));
        let account = cmd.execute(&ctx).unwrap().into_account().unwrap();

        cmd.undo(&ctx).unwrap();
        assert!(ctx.accounts().get(account.id).unwrap().is_none());
        assert_eq!(ctx.operations().count().unwrap(), 0);
        assert_eq!(ctx.categories().count().unwrap(), 0);
    }

    #[test]
    fn test_redo_restores_same_account_and_entry() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(CreateAccount::new(
            "Cash",
            Money::new(dec!(50), "RUB").unwrap(),
            "",
        ));
        let account = cmd.execute(&ctx).unwrap().into_account().unwrap();
        let entry = ctx.operations().get_by_account(account.id).unwrap()[0].id;

        cmd.undo(&ctx).unwrap();
        let again = cmd.execute(&ctx).unwrap().into_account().unwrap();

        assert_eq!(again.id, account.id);
        assert_eq!(again.balance, Money::new(dec!(50), "RUB").unwrap());
        let ops = ctx.operations().get_by_account(account.id).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, entry);
        let category = ctx
            .categories()
            .get_by_name(OPENING_BALANCE_CATEGORY)
            .unwrap()
            .unwrap();
        assert_eq!(ops[0].category_id, category.id);
    }

    #[test]
    fn test_existing_opening_category_survives_undo() {
        let ctx = LedgerContext::in_memory();
        BaseCommand::new(CreateAccount::new("First", Money::new(dec!(10), "RUB").unwrap(), ""))
            .execute(&ctx)
            .unwrap();

        let mut second = BaseCommand::new(CreateAccount::new(
            "Second",
            Money::new(dec!(20), "RUB").unwrap(),
            "",
        ));
        second.execute(&ctx).unwrap();
        second.undo(&ctx).unwrap();

        assert_eq!(ctx.categories().count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_name_refused() {
        let ctx = LedgerContext::in_memory();
        BaseCommand::new(CreateAccount::new("Cash", Money::zero("RUB").unwrap(), ""))
            .execute(&ctx)
            .unwrap();

        let err = BaseCommand::new(CreateAccount::new("cash", Money::zero("RUB").unwrap(), ""))
            .execute(&ctx)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
        assert_eq!(ctx.accounts().count().unwrap(), 1);

        // A refused account leaves no opening category behind
        let err = BaseCommand::new(CreateAccount::new(
            "CASH",
            Money::new(dec!(5), "RUB").unwrap(),
            "",
        ))
        .execute(&ctx)
        .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
        assert_eq!(ctx.categories().count().unwrap(), 0);
    }

    #[test]
    fn test_invalid_input_creates_nothing() {
        let ctx = LedgerContext::in_memory();
        let err = BaseCommand::new(CreateAccount::new(
            "",
            Money::new(dec!(50), "RUB").unwrap(),
            "",
        ))
        .execute(&ctx)
        .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ctx.accounts().count().unwrap(), 0);
        assert_eq!(ctx.operations().count().unwrap(), 0);
    }
}
