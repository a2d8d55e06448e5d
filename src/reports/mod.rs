//! Text reports
//!
//! Period analytics and balance reconciliation rendered for the terminal.

pub mod analytics;
pub mod reconciliation;

pub use analytics::PeriodReport;
pub use reconciliation::ReconciliationReport;
