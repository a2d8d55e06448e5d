//! Explicit dependency bundle handed to every command
//!
//! The storage, entity factory, command journal and performance statistics
//! are built once and passed by reference. Nothing in the crate reaches for
//! them through globals, so tests can run side by side with isolated state.

use std::sync::Arc;

use crate::factory::EntityFactory;
use crate::journal::CommandJournal;
use crate::pipeline::PerformanceStats;
use crate::storage::{AccountRepository, CategoryRepository, OperationRepository, Storage, UnitOfWork};

/// Everything a command needs to run
#[derive(Clone)]
pub struct LedgerContext {
    store: Arc<dyn UnitOfWork>,
    factory: EntityFactory,
    journal: Arc<CommandJournal>,
    stats: Arc<PerformanceStats>,
}

impl LedgerContext {
    pub fn new(
        store: Arc<dyn UnitOfWork>,
        journal: Arc<CommandJournal>,
        stats: Arc<PerformanceStats>,
    ) -> Self {
        Self {
            store,
            factory: EntityFactory::new(),
            journal,
            stats,
        }
    }

    /// In-memory storage, console-only journal and fresh statistics
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(Storage::in_memory()),
            Arc::new(CommandJournal::console_only()),
            Arc::new(PerformanceStats::new()),
        )
    }

    pub fn store(&self) -> &dyn UnitOfWork {
        self.store.as_ref()
    }

    pub fn accounts(&self) -> &AccountRepository {
        self.store.accounts()
    }

    pub fn categories(&self) -> &CategoryRepository {
        self.store.categories()
    }

    pub fn operations(&self) -> &OperationRepository {
        self.store.operations()
    }

    pub fn factory(&self) -> &EntityFactory {
        &self.factory
    }

    pub fn journal(&self) -> &CommandJournal {
        &self.journal
    }

    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    /// Shared handle to the statistics, for reporting after commands ran
    pub fn stats_handle(&self) -> Arc<PerformanceStats> {
        Arc::clone(&self.stats)
    }
}
