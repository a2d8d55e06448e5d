//! Journal layer: records start and outcome of every step, never swallows

use tracing::warn;

use crate::error::LedgerResult;
use crate::journal::{CommandJournal, CommandPhase, JournalEntry};

/// Run `f`, journaling that it started and how it ended
///
/// Errors from `f` are re-raised unchanged after being journaled. A journal
/// that cannot be written only produces a warning.
pub fn logged<T>(
    journal: &CommandJournal,
    name: &str,
    phase: CommandPhase,
    f: impl FnOnce() -> LedgerResult<T>,
) -> LedgerResult<T> {
    write(journal, JournalEntry::started(name, phase));

    match f() {
        Ok(value) => {
            write(journal, JournalEntry::succeeded(name, phase));
            Ok(value)
        }
        Err(e) => {
            write(journal, JournalEntry::failed(name, phase, e.to_string()));
            Err(e)
        }
    }
}

fn write(journal: &CommandJournal, entry: JournalEntry) {
    if let Err(e) = journal.record(&entry) {
        warn!(error = %e, command = %entry.command, "Failed to write journal entry");
    }
}
