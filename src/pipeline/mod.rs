//! Command pipeline
//!
//! Cross-cutting layers applied around a command, outermost first:
//!
//! 1. logging: journal entries before and after each step
//! 2. performance: wall-clock timing and shared statistics
//! 3. validation: before/after hooks, refuses undo of non-undoable commands
//! 4. transaction: unit-of-work begin/commit, rollback on error
//!
//! Any subset can be enabled with [`Decorations`]; the order of the enabled
//! layers never changes.

mod logging;
mod performance;
mod transaction;
mod validation;

pub use logging::logged;
pub use performance::{stats_key, timed, CommandStats, PerformanceStats, Timings};
pub use transaction::within_unit_of_work;
pub use validation::{validated, NoValidation, ValidationHooks};

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::commands::{Command, CommandOutput};
use crate::context::LedgerContext;
use crate::error::{LedgerError, LedgerResult};
use crate::journal::CommandPhase;

/// Set of enabled pipeline layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decorations(u8);

impl Decorations {
    pub const NONE: Decorations = Decorations(0);
    pub const PERFORMANCE: Decorations = Decorations(1);
    pub const LOGGING: Decorations = Decorations(1 << 1);
    pub const VALIDATION: Decorations = Decorations(1 << 2);
    pub const TRANSACTION: Decorations = Decorations(1 << 3);
    pub const ALL: Decorations = Decorations(0b1111);

    /// Layer names in pipeline order
    const NAMED: [(&'static str, Decorations); 4] = [
        ("logging", Decorations::LOGGING),
        ("performance", Decorations::PERFORMANCE),
        ("validation", Decorations::VALIDATION),
        ("transaction", Decorations::TRANSACTION),
    ];

    pub fn contains(self, other: Decorations) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine layer names such as `"logging"` or `"all"`
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> LedgerResult<Self> {
        let mut layers = Decorations::NONE;
        for name in names {
            let name = name.trim().to_lowercase();
            layers |= match name.as_str() {
                "" | "none" => Decorations::NONE,
                "all" => Decorations::ALL,
                other => Self::NAMED
                    .iter()
                    .find(|(known, _)| *known == other)
                    .map(|(_, layer)| *layer)
                    .ok_or_else(|| {
                        LedgerError::Config(format!(
                            "Unknown pipeline layer '{}'. Valid layers: none, logging, performance, validation, transaction, all",
                            other
                        ))
                    })?,
            };
        }
        Ok(layers)
    }
}

impl Default for Decorations {
    fn default() -> Self {
        Decorations::PERFORMANCE | Decorations::LOGGING
    }
}

impl BitOr for Decorations {
    type Output = Decorations;

    fn bitor(self, rhs: Decorations) -> Decorations {
        Decorations(self.0 | rhs.0)
    }
}

impl BitOrAssign for Decorations {
    fn bitor_assign(&mut self, rhs: Decorations) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Decorations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, layer)| self.contains(*layer))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "{}", names.join("+"))
    }
}

/// Parses `"logging+transaction"` or `"logging,transaction"`
impl FromStr for Decorations {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decorations::from_names(s.split(|c| c == '+' || c == ','))
    }
}

/// A command running inside the enabled pipeline layers
pub struct DecoratedCommand {
    inner: Box<dyn Command>,
    layers: Decorations,
    hooks: Box<dyn ValidationHooks>,
    timings: Timings,
}

impl DecoratedCommand {
    pub fn new(inner: Box<dyn Command>, layers: Decorations) -> Self {
        Self {
            inner,
            layers,
            hooks: Box::new(NoValidation),
            timings: Timings::default(),
        }
    }

    /// Replace the validation hooks
    pub fn with_hooks(mut self, hooks: impl ValidationHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn layers(&self) -> Decorations {
        self.layers
    }

    /// Durations measured by the performance layer
    pub fn timings(&self) -> Timings {
        self.timings
    }

    fn run<T>(
        &mut self,
        ctx: &LedgerContext,
        phase: CommandPhase,
        call: impl FnOnce(&mut dyn Command, &LedgerContext) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let DecoratedCommand {
            inner,
            layers,
            hooks,
            timings,
        } = self;
        let layers = *layers;
        let name = inner.name().to_string();
        let kind = inner.kind().to_string();
        let can_undo = inner.can_undo();
        let command: &mut dyn Command = &mut **inner;

        let transacted = || {
            if layers.contains(Decorations::TRANSACTION) {
                within_unit_of_work(ctx.store(), &name, || call(command, ctx))
            } else {
                call(command, ctx)
            }
        };

        let checked = || {
            if layers.contains(Decorations::VALIDATION) {
                validated(&**hooks, &name, phase, can_undo, ctx, transacted)
            } else {
                transacted()
            }
        };

        let measured = || {
            if layers.contains(Decorations::PERFORMANCE) {
                timed(ctx.stats(), timings, &kind, phase, checked)
            } else {
                checked()
            }
        };

        if layers.contains(Decorations::LOGGING) {
            logged(ctx.journal(), &name, phase, measured)
        } else {
            measured()
        }
    }
}

impl Command for DecoratedCommand {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> &str {
        self.inner.kind()
    }

    fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    fn execute(&mut self, ctx: &LedgerContext) -> LedgerResult<CommandOutput> {
        self.run(ctx, CommandPhase::Execute, |command, ctx| command.execute(ctx))
    }

    fn undo(&mut self, ctx: &LedgerContext) -> LedgerResult<()> {
        self.run(ctx, CommandPhase::Undo, |command, ctx| command.undo(ctx))
    }
}

/// Wrap `command` in the requested layers; an empty set returns it unchanged
pub fn decorate(command: Box<dyn Command>, layers: Decorations) -> Box<dyn Command> {
    if layers.is_empty() {
        command
    } else {
        Box::new(DecoratedCommand::new(command, layers))
    }
}
