//! Validation layer: extension hooks around the wrapped step

use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::journal::CommandPhase;

/// Checks run before and after a decorated command step
///
/// Both default to accepting everything.
pub trait ValidationHooks: Send {
    fn before(&self, _name: &str, _phase: CommandPhase, _ctx: &LedgerContext) -> LedgerResult<()> {
        Ok(())
    }

    fn after(&self, _name: &str, _phase: CommandPhase, _ctx: &LedgerContext) -> LedgerResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoValidation;

impl ValidationHooks for NoValidation {}

/// Run `f` between the hooks; undo of a non-undoable command never starts
pub fn validated<T>(
    hooks: &dyn ValidationHooks,
    name: &str,
    phase: CommandPhase,
    can_undo: bool,
    ctx: &LedgerContext,
    f: impl FnOnce() -> LedgerResult<T>,
) -> LedgerResult<T> {
    if phase == CommandPhase::Undo && !can_undo {
        return Err(LedgerError::NotUndoable(name.to_string()));
    }

    hooks.before(name, phase, ctx)?;
    let value = f()?;
    hooks.after(name, phase, ctx)?;
    Ok(value)
}
