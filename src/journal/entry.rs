//! Journal entry data structures
//!
//! One entry per observed step of a command: it started, it succeeded, or it
//! failed with a message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which half of the command contract ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandPhase {
    Execute,
    Undo,
}

impl fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandPhase::Execute => write!(f, "execute"),
            CommandPhase::Undo => write!(f, "undo"),
        }
    }
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Started,
    Succeeded,
    Failed,
}

/// A single journal line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the step was observed (UTC)
    pub timestamp: DateTime<Utc>,

    /// Command label
    pub command: String,

    pub phase: CommandPhase,

    pub outcome: Outcome,

    /// Error message for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JournalEntry {
    pub fn started(command: impl Into<String>, phase: CommandPhase) -> Self {
        Self::new(command, phase, Outcome::Started, None)
    }

    pub fn succeeded(command: impl Into<String>, phase: CommandPhase) -> Self {
        Self::new(command, phase, Outcome::Succeeded, None)
    }

    pub fn failed(command: impl Into<String>, phase: CommandPhase, message: impl Into<String>) -> Self {
        Self::new(command, phase, Outcome::Failed, Some(message.into()))
    }

    fn new(
        command: impl Into<String>,
        phase: CommandPhase,
        outcome: Outcome,
        message: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            command: command.into(),
            phase,
            outcome,
            message,
        }
    }

    /// The message without timestamp, e.g. "Executing command: Transfer"
    pub fn summary(&self) -> String {
        let name = &self.command;
        let message = self.message.as_deref().unwrap_or("unknown error");
        match (self.phase, self.outcome) {
            (CommandPhase::Execute, Outcome::Started) => format!("Executing command: {}", name),
            (CommandPhase::Execute, Outcome::Succeeded) => {
                format!("Successfully executed: {}", name)
            }
            (CommandPhase::Execute, Outcome::Failed) => {
                format!("Error executing {}: {}", name, message)
            }
            (CommandPhase::Undo, Outcome::Started) => format!("Undoing command: {}", name),
            (CommandPhase::Undo, Outcome::Succeeded) => format!("Successfully undone: {}", name),
            (CommandPhase::Undo, Outcome::Failed) => format!("Error undoing {}: {}", name, message),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            self.summary()
        )
    }
}
