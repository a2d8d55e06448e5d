use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ledger::cli::{run_command, run_shell, LedgerCommands};
use ledger::config::{LedgerPaths, Settings};
use ledger::ledger::Ledger;
use ledger::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "ledger",
    author = "Kaylee Beyene",
    version,
    about = "Terminal ledger with undoable commands and balance reconciliation",
    long_about = "ledger keeps bank accounts, categorised income and expenses, and \
                  transfers in JSON files. Every change runs as a command through a \
                  logging and timing pipeline; the interactive shell can undo and \
                  redo them."
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and the starter categories
    Init,

    /// Show current configuration and paths
    Config,

    /// Interactive session with undo and redo
    #[command(alias = "repl")]
    Shell,

    #[command(flatten)]
    Ledger(LedgerCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ledger::logging::init(cli.quiet);

    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing ledger at: {}", paths.base_dir().display());
            let storage = Storage::new(paths.clone())?;
            storage.load_all()?;
            let created = initialize_storage(&storage)?;

            let mut settings = settings;
            settings.setup_completed = true;
            settings.save(&paths)?;

            println!("Initialization complete!");
            if created > 0 {
                println!("Created {} default categories.", created);
            }
            println!();
            println!("Run 'ledger account create <name> --balance <amount>' to add an account.");
        }
        Some(Commands::Config) => {
            println!("Ledger Configuration");
            println!("====================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Default currency: {}", settings.default_currency);
            println!("  Pipeline layers:  {}", settings.decorations()?);
            if settings.journal_enabled {
                println!(
                    "  Command journal:  {}",
                    paths.resolve(&settings.journal_file).display()
                );
            } else {
                println!("  Command journal:  disabled");
            }
            println!("  Auto-fix balances after edits: {}", settings.auto_fix_after_edit);
            match settings.cache_ttl() {
                Some(ttl) => println!("  Read cache:       {}s", ttl.as_secs()),
                None => println!("  Read cache:       disabled"),
            }
        }
        Some(Commands::Shell) => {
            let mut ledger = Ledger::open(&paths, &settings)?;
            run_shell(&mut ledger)?;
        }
        Some(Commands::Ledger(cmd)) => {
            let mut ledger = Ledger::open(&paths, &settings)?;
            run_command(&mut ledger, cmd)?;
            ledger.save().context("Failed to save ledger data")?;
        }
        None => {
            println!("ledger - accounts, operations and transfers from the terminal");
            println!();
            println!("Run 'ledger --help' for usage information.");
            println!("Run 'ledger shell' for an interactive session with undo.");
        }
    }

    Ok(())
}
