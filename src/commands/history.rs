//! Linear undo/redo history
//!
//! Commands live in a plain vector with a cursor pointing one past the last
//! executed command. Executing a new command while the cursor is not at the
//! end drops every undone command first; there is no branching history.

use tracing::debug;

use crate::context::LedgerContext;
use crate::error::LedgerResult;

use super::{Command, CommandOutput};

#[derive(Default)]
pub struct CommandHistory {
    commands: Vec<Box<dyn Command>>,
    cursor: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the redo tail, run `command` and append it
    ///
    /// The tail is discarded even when the command then fails. A failed
    /// command is not recorded.
    pub fn execute(
        &mut self,
        mut command: Box<dyn Command>,
        ctx: &LedgerContext,
    ) -> LedgerResult<CommandOutput> {
        if self.cursor < self.commands.len() {
            debug!(
                discarded = self.commands.len() - self.cursor,
                "Dropping undone commands"
            );
            self.commands.truncate(self.cursor);
        }

        let output = command.execute(ctx)?;
        self.commands.push(command);
        self.cursor = self.commands.len();
        Ok(output)
    }

    /// Undo the command before the cursor
    ///
    /// Returns the name of the undone command, or `None` when there was
    /// nothing to undo. On error the cursor stays where it was.
    pub fn undo(&mut self, ctx: &LedgerContext) -> LedgerResult<Option<String>> {
        if !self.can_undo() {
            return Ok(None);
        }

        let command = &mut self.commands[self.cursor - 1];
        command.undo(ctx)?;
        self.cursor -= 1;
        Ok(Some(command.name().to_string()))
    }

    /// Re-execute the command at the cursor
    pub fn redo(&mut self, ctx: &LedgerContext) -> LedgerResult<Option<String>> {
        if !self.can_redo() {
            return Ok(None);
        }

        let command = &mut self.commands[self.cursor];
        command.execute(ctx)?;
        self.cursor += 1;
        Ok(Some(command.name().to_string()))
    }

    /// True when a command precedes the cursor and it supports undo
    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && self.commands[self.cursor - 1].can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }

    /// Names of all recorded commands, oldest first
    pub fn history_names(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Scripted;
    use crate::commands::{AddOperation, BaseCommand, CreateAccount, CreateCategory};
    use crate::models::{AccountId, CategoryType, Money};
    use rust_decimal_macros::dec;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_empty_history_is_a_no_op() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();

        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo(&ctx).unwrap(), None);
        assert_eq!(history.redo(&ctx).unwrap(), None);
    }

    #[test]
    fn test_undo_and_redo_move_cursor() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        let scripted = Scripted::new("A");
        let executions = scripted.executions.clone();
        let undos = scripted.undos.clone();

        history.execute(BaseCommand::boxed(scripted), &ctx).unwrap();
        assert_eq!(history.cursor(), 1);

        assert_eq!(history.undo(&ctx).unwrap().as_deref(), Some("A"));
        assert_eq!(history.cursor(), 0);
        assert!(history.can_redo());

        assert_eq!(history.redo(&ctx).unwrap().as_deref(), Some("A"));
        assert_eq!(history.cursor(), 1);
        assert_eq!(executions.load(Ordering::SeqCst), 2);
        assert_eq!(undos.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_command_discards_redo_tail() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        let b = Scripted::new("B");
        let b_executions = b.executions.clone();

        history.execute(BaseCommand::boxed(Scripted::new("A")), &ctx).unwrap();
        history.execute(BaseCommand::boxed(b), &ctx).unwrap();
        history.undo(&ctx).unwrap();
        history.execute(BaseCommand::boxed(Scripted::new("C")), &ctx).unwrap();

        assert!(!history.can_redo());
        assert_eq!(history.history_names(), vec!["A", "C"]);
        assert_eq!(b_executions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_discarded_command_effects_are_absent() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();

        let account = history
            .execute(
                BaseCommand::boxed(CreateAccount::new("A", Money::zero("RUB").unwrap(), "")),
                &ctx,
            )
            .unwrap()
            .into_account()
            .unwrap();
        let salary = history
            .execute(
                BaseCommand::boxed(CreateCategory::new(CategoryType::Income, "Salary", "")),
                &ctx,
            )
            .unwrap()
            .into_category()
            .unwrap();
        let income = |amount| {
            BaseCommand::boxed(AddOperation::income(
                account.id,
                Money::new(amount, "RUB").unwrap(),
                salary.id,
                "",
            ))
        };

        history.execute(income(dec!(100)), &ctx).unwrap();
        history.execute(income(dec!(40)), &ctx).unwrap();
        history.undo(&ctx).unwrap();
        history.execute(income(dec!(5)), &ctx).unwrap();

        assert!(!history.can_redo());
        let stored = ctx.accounts().get(account.id).unwrap().unwrap();
        assert_eq!(stored.balance, Money::new(dec!(105), "RUB").unwrap());
        assert_eq!(ctx.operations().get_by_account(account.id).unwrap().len(), 2);
    }

    #[test]
    fn test_non_undoable_command_blocks_undo() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        let mut fixed = Scripted::new("fixed");
        fixed.undoable = false;

        history.execute(BaseCommand::boxed(Scripted::new("A")), &ctx).unwrap();
        history.execute(BaseCommand::boxed(fixed), &ctx).unwrap();

        assert!(!history.can_undo());
        assert_eq!(history.undo(&ctx).unwrap(), None);
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();

        let err = history
            .execute(
                BaseCommand::boxed(AddOperation::income(
                    AccountId::new(),
                    Money::new(dec!(1), "RUB").unwrap(),
                    crate::models::CategoryId::new(),
                    "",
                )),
                &ctx,
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(history.is_empty());
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_failed_undo_keeps_cursor() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();

        let account = history
            .execute(
                BaseCommand::boxed(CreateAccount::new("A", Money::zero("RUB").unwrap(), "")),
                &ctx,
            )
            .unwrap()
            .into_account()
            .unwrap();
        ctx.accounts().delete(account.id).unwrap();

        assert!(history.undo(&ctx).unwrap_err().is_not_found());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_clear() {
        let ctx = LedgerContext::in_memory();
        let mut history = CommandHistory::new();
        history.execute(BaseCommand::boxed(Scripted::new("A")), &ctx).unwrap();

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), 0);
        assert!(history.history_names().is_empty());
    }
}
