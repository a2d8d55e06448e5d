//! Command journal sink
//!
//! Every entry is echoed through `tracing` and, when a destination is set,
//! appended to a line-delimited JSON file. The destination can be swapped
//! at runtime; a mutex serialises appends from concurrent commands.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{error, info};

use crate::error::{LedgerError, LedgerResult};

use super::entry::{JournalEntry, Outcome};

/// Shared, append-only log of command activity
pub struct CommandJournal {
    destination: Mutex<Option<PathBuf>>,
}

impl CommandJournal {
    /// Create a journal writing to `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            destination: Mutex::new(Some(path)),
        }
    }

    /// Create a journal that only echoes to tracing
    pub fn console_only() -> Self {
        Self {
            destination: Mutex::new(None),
        }
    }

    /// Change where entries are appended; `None` stops file output
    pub fn set_destination(&self, path: Option<PathBuf>) -> LedgerResult<()> {
        *self.lock()? = path;
        Ok(())
    }

    pub fn destination(&self) -> Option<PathBuf> {
        self.lock().ok().and_then(|d| d.clone())
    }

    /// Record an entry
    pub fn record(&self, entry: &JournalEntry) -> LedgerResult<()> {
        match entry.outcome {
            Outcome::Failed => error!(command = %entry.command, phase = %entry.phase, "{}", entry.summary()),
            _ => info!(command = %entry.command, phase = %entry.phase, "{}", entry.summary()),
        }

        let destination = self.lock()?;
        let Some(path) = destination.as_ref() else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LedgerError::Io(format!("Failed to open command journal: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| LedgerError::Json(format!("Failed to serialize journal entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| LedgerError::Io(format!("Failed to write journal entry: {}", e)))?;

        file.flush()
            .map_err(|e| LedgerError::Io(format!("Failed to flush command journal: {}", e)))
    }

    /// Read all entries from the current destination, oldest first
    pub fn read_all(&self) -> LedgerResult<Vec<JournalEntry>> {
        match self.destination() {
            Some(path) => read_entries(&path),
            None => Ok(Vec::new()),
        }
    }

    /// Read the most recent N entries
    pub fn read_recent(&self, count: usize) -> LedgerResult<Vec<JournalEntry>> {
        let mut entries = self.read_all()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Option<PathBuf>>> {
        self.destination
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire journal lock: {}", e)))
    }
}

fn read_entries(path: &Path) -> LedgerResult<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| LedgerError::Io(format!("Failed to open command journal: {}", e)))?;

    let mut entries = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            LedgerError::Io(format!("Failed to read journal line {}: {}", line_num + 1, e))
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: JournalEntry = serde_json::from_str(&line).map_err(|e| {
            LedgerError::Json(format!(
                "Failed to parse journal entry at line {}: {}",
                line_num + 1,
                e
            ))
        })?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::entry::CommandPhase;
    use tempfile::TempDir;

    fn create_test_journal() -> (CommandJournal, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let journal = CommandJournal::new(temp_dir.path().join("command.log"));
        (journal, temp_dir)
    }

    #[test]
    fn test_record_and_read() {
        let (journal, _temp) = create_test_journal();
        journal
            .record(&JournalEntry::started("Transfer", CommandPhase::Execute))
            .unwrap();
        journal
            .record(&JournalEntry::failed("Transfer", CommandPhase::Execute, "boom"))
            .unwrap();

        let entries = journal.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].outcome, Outcome::Failed);
        assert_eq!(entries[1].message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_read_recent() {
        let (journal, _temp) = create_test_journal();
        for i in 0..10 {
            journal
                .record(&JournalEntry::succeeded(format!("cmd-{}", i), CommandPhase::Execute))
                .unwrap();
        }

        let recent = journal.read_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].command, "cmd-7");
        assert_eq!(recent[2].command, "cmd-9");
    }

    #[test]
    fn test_switching_destination() {
        let (journal, temp) = create_test_journal();
        journal
            .record(&JournalEntry::started("first", CommandPhase::Execute))
            .unwrap();

        let other = temp.path().join("other.log");
        journal.set_destination(Some(other.clone())).unwrap();
        journal
            .record(&JournalEntry::started("second", CommandPhase::Execute))
            .unwrap();

        assert_eq!(journal.read_all().unwrap().len(), 1);
        assert_eq!(journal.destination(), Some(other));

        journal.set_destination(None).unwrap();
        journal
            .record(&JournalEntry::started("third", CommandPhase::Execute))
            .unwrap();
        assert!(journal.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_console_only_journal_has_no_entries() {
        let journal = CommandJournal::console_only();
        journal
            .record(&JournalEntry::started("x", CommandPhase::Undo))
            .unwrap();
        assert!(journal.read_all().unwrap().is_empty());
    }
}
