//! Service layer for the ledger
//!
//! Services work directly on a `UnitOfWork` for everything that is not an
//! undoable command: lookups, edits, reconciliation and analytics.

pub mod account;
pub mod analytics;
pub mod category;
pub mod operation;
pub mod reconciliation;

pub use account::AccountService;
pub use analytics::{AccountSummary, AnalyticsService, CategoryTotal, PeriodAnalytics};
pub use category::{CategoryService, CategoryUpdate};
pub use operation::OperationService;
pub use reconciliation::{AccountBalance, ReconciliationService};
