//! Command journal
//!
//! The append-only log the logging layer of the command pipeline writes to.
//!
//! - `JournalEntry`: one observed step of a command (started, succeeded,
//!   failed) with a timestamp.
//! - `CommandJournal`: the shared sink. It echoes entries through `tracing`
//!   and appends them as JSON lines to a configurable destination file.

mod entry;
mod logger;

pub use entry::{CommandPhase, JournalEntry, Outcome};
pub use logger::CommandJournal;
