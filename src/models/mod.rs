//! Core data models for the ledger
//!
//! This module contains the data structures that represent the ledger
//! domain: money, accounts, categories, operations and date ranges.

pub mod account;
pub mod category;
pub mod date_range;
pub mod ids;
pub mod money;
pub mod operation;

pub use account::{Account, AccountValidationError};
pub use category::{Category, CategoryType, CategoryValidationError};
pub use date_range::DateRange;
pub use ids::{AccountId, CategoryId, OperationId};
pub use money::{Money, DEFAULT_CURRENCY};
pub use operation::{Operation, OperationType, RecurrencePattern};
