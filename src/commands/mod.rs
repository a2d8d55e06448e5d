//! Reversible commands
//!
//! Every change to the ledger that should be undoable is expressed as a
//! command. A command runs at most once before it is undone: the
//! `Idle -> Executed -> Idle` state machine lives in [`BaseCommand`], and the
//! concrete commands only describe their effect and its reversal.
//!
//! Undo reverses exactly the command's own effect. It never restores a
//! captured balance, so work done on the same account in between survives,
//! and the stored balance keeps matching the sum of the recorded operations.

pub mod account;
pub mod category;
pub mod history;
pub mod operation;
pub mod transfer;

pub use account::CreateAccount;
pub use category::CreateCategory;
pub use history::CommandHistory;
pub use operation::AddOperation;
pub use transfer::{Transfer, TransferReceipt, TRANSFER_CATEGORY};

use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, Category, Operation};

/// The contract the history and the pipeline work against
pub trait Command: Send {
    /// Label for history display and the journal, including the details
    fn name(&self) -> &str;

    /// Label shared by every command of the same kind, such as `"Transfer"`
    fn kind(&self) -> &str;

    /// Whether `undo` is supported
    fn can_undo(&self) -> bool;

    /// Perform the effect; fails with `AlreadyExecuted` on a second call
    fn execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput>;

    /// Reverse the effect; fails with `NotExecuted` or `NotUndoable`
    fn undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()>;
}

/// What a command produced
#[derive(Debug, Clone)]
pub enum CommandOutput {
    None,
    Account(Account),
    Category(Category),
    Operation(Operation),
    Transfer(Box<TransferReceipt>),
}

impl CommandOutput {
    pub fn into_account(self) -> Option<Account> {
        match self {
            CommandOutput::Account(account) => Some(account),
            _ => None,
        }
    }

    pub fn into_category(self) -> Option<Category> {
        match self {
            CommandOutput::Category(category) => Some(category),
            _ => None,
        }
    }

    pub fn into_operation(self) -> Option<Operation> {
        match self {
            CommandOutput::Operation(operation) => Some(operation),
            _ => None,
        }
    }

    pub fn into_transfer(self) -> Option<TransferReceipt> {
        match self {
            CommandOutput::Transfer(receipt) => Some(*receipt),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            CommandOutput::None => "nothing",
            CommandOutput::Account(_) => "an account",
            CommandOutput::Category(_) => "a category",
            CommandOutput::Operation(_) => "an operation",
            CommandOutput::Transfer(_) => "a transfer",
        }
    }

    /// Unwrap an expected output variant or report the mismatch
    pub(crate) fn extract<T>(
        self,
        wanted: &str,
        pick: impl FnOnce(CommandOutput) -> Option<T>,
    ) -> LedgerResult<T> {
        let produced = self.kind();
        pick(self).ok_or_else(|| {
            LedgerError::Internal(format!("expected {} but the command produced {}", wanted, produced))
        })
    }
}

/// The effect-specific half of a command
///
/// `do_execute` and `do_undo` must either succeed completely or leave the
/// ledger as they found it.
pub trait CommandBody: Send {
    fn name(&self) -> String;

    fn kind(&self) -> &'static str;

    fn can_undo(&self) -> bool {
        true
    }

    fn do_execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput>;

    fn do_undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()>;
}

/// Adds the executed/idle bookkeeping to a [`CommandBody`]
pub struct BaseCommand<B> {
    name: String,
    executed: bool,
    body: B,
}

impl<B: CommandBody> BaseCommand<B> {
    pub fn new(body: B) -> Self {
        Self {
            name: body.name(),
            executed: false,
            body,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    /// Box the command for the history or the pipeline
    pub fn boxed(body: B) -> Box<dyn Command>
    where
        B: 'static,
    {
        Box::new(Self::new(body))
    }
}

impl<B: CommandBody> Command for BaseCommand<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        self.body.kind()
    }

    fn can_undo(&self) -> bool {
        self.body.can_undo()
    }

    fn execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput> {
        if self.executed {
            return Err(LedgerError::AlreadyExecuted(self.name.clone()));
        }
        let output = self.body.do_execute(ctx)?;
        self.executed = true;
        Ok(output)
    }

    fn undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()> {
        if !self.executed {
            return Err(LedgerError::NotExecuted(self.name.clone()));
        }
        if !self.body.can_undo() {
            return Err(LedgerError::NotUndoable(self.name.clone()));
        }
        self.body.do_undo(ctx)?;
        self.executed = false;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Scripted;
    use super::*;

    #[test]
    fn test_execute_twice_is_already_executed() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(Scripted::new("scripted"));

        cmd.execute(&ctx).unwrap();
        let err = cmd.execute(&ctx).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExecuted(name) if name == "scripted"));
    }

    #[test]
    fn test_undo_before_execute_is_not_executed() {
        let ctx = LedgerContext::in_memory();
        let mut cmd = BaseCommand::new(Scripted::new("scripted"));
        assert!(matches!(
            cmd.undo(&ctx).unwrap_err(),
            LedgerError::NotExecuted(_)
        ));
    }

    #[test]
    fn test_undo_of_non_undoable_is_refused() {
        let ctx = LedgerContext::in_memory();
        let mut scripted = Scripted::new("report");
        scripted.undoable = false;
        let mut cmd = BaseCommand::new(scripted);

        cmd.execute(&ctx).unwrap();
        assert!(!cmd.can_undo());
        assert!(matches!(
            cmd.undo(&ctx).unwrap_err(),
            LedgerError::NotUndoable(_)
        ));
        assert!(cmd.is_executed());
    }

    #[test]
    fn test_execute_undo_execute_cycle() {
        let ctx = LedgerContext::in_memory();
        let scripted = Scripted::new("scripted");
        let executions = scripted.executions.clone();
        let mut cmd = BaseCommand::new(scripted);

        cmd.execute(&ctx).unwrap();
        cmd.undo(&ctx).unwrap();
        assert!(!cmd.is_executed());
        cmd.execute(&ctx).unwrap();
        assert_eq!(executions.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_execute_stays_idle() {
        let ctx = LedgerContext::in_memory();
        let mut scripted = Scripted::new("scripted");
        scripted.fail_execute = true;
        let mut cmd = BaseCommand::new(scripted);

        assert!(cmd.execute(&ctx).unwrap_err().is_domain_rule());
        assert!(!cmd.is_executed());
        assert!(matches!(
            cmd.undo(&ctx).unwrap_err(),
            LedgerError::NotExecuted(_)
        ));
    }
}
