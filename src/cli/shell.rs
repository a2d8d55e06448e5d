//! Interactive shell
//!
//! Reads one command per line from stdin, tokenised like a POSIX shell, and
//! runs it against a single long-lived ledger. Unlike one-shot invocations
//! the shell keeps the command history, so `undo`, `redo` and `history` are
//! available here. Data is saved after every line that changed something.

use std::io::{self, BufRead, IsTerminal, Write};

use clap::{Parser, Subcommand};
use shell_words::split;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

use super::{run_command, LedgerCommands};

const PROMPT: &str = "ledger> ";

#[derive(Parser, Debug)]
#[command(
    name = "ledger",
    no_binary_name = true,
    disable_version_flag = true,
    subcommand_required = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    Ledger(LedgerCommands),

    /// Undo the last command
    Undo,

    /// Redo the last undone command
    Redo,

    /// List the commands of this session
    History,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

/// What the read loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Run the shell until `exit` or end of input
pub fn run_shell(ledger: &mut Ledger) -> LedgerResult<()> {
    let interactive = io::stdin().is_terminal();
    if interactive {
        println!("Ledger shell. Type 'help' for commands, 'exit' to leave.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("{}", PROMPT);
            io::stdout().flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        match execute_line(ledger, &line?) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    ledger.save()
}

/// Parse and run one shell line
pub fn execute_line(ledger: &mut Ledger, line: &str) -> LedgerResult<LoopControl> {
    let tokens = split(line)
        .map_err(|e| LedgerError::Validation(format!("Cannot parse line: {}", e)))?;
    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let parsed = match ShellLine::try_parse_from(&tokens) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Help and usage errors are printed, not treated as failures.
            print!("{}", e.render());
            return Ok(LoopControl::Continue);
        }
    };

    debug!(line = line.trim(), "Shell command");
    match parsed.command {
        ShellCommand::Ledger(cmd) => {
            run_command(ledger, cmd)?;
            ledger.save()?;
        }
        ShellCommand::Undo => match ledger.undo()? {
            Some(name) => {
                ledger.save()?;
                println!("Undone: {}", name);
            }
            None => println!("Nothing to undo."),
        },
        ShellCommand::Redo => match ledger.redo()? {
            Some(name) => {
                ledger.save()?;
                println!("Redone: {}", name);
            }
            None => println!("Nothing to redo."),
        },
        ShellCommand::History => print!("{}", format_history(ledger)),
        ShellCommand::Exit => return Ok(LoopControl::Exit),
    }

    Ok(LoopControl::Continue)
}

fn format_history(ledger: &Ledger) -> String {
    let names = ledger.history_names();
    if names.is_empty() {
        return "No commands in this session.\n".to_string();
    }

    let cursor = ledger.history_cursor();
    let mut output = String::new();
    for (i, name) in names.iter().enumerate() {
        let marker = if i < cursor { " " } else { "~" };
        output.push_str(&format!("{} {:>3}. {}\n", marker, i + 1, name));
    }
    if cursor < names.len() {
        output.push_str("\n~ undone, can be redone\n");
    }
    output
}
