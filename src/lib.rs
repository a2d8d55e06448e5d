//! ledger - terminal bookkeeping with undoable commands
//!
//! This library provides the core of the `ledger` application: bank accounts
//! holding currency-tagged balances, categorised income and expense
//! operations, and transfers between accounts. Every change is a reversible
//! command run through a configurable pipeline (logging, timing, validation,
//! transaction) and recorded in an undo/redo history.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Money, accounts, categories, operations and date ranges
//! - `factory`: Validated construction of new entities
//! - `storage`: In-memory repositories with JSON persistence and a unit of work
//! - `journal`: Append-only log of command activity
//! - `commands`: Reversible commands and their history
//! - `pipeline`: Decorator layers wrapped around commands
//! - `context`: The dependency bundle every command receives
//! - `ledger`: Facade that builds, decorates and records commands
//! - `services`: Queries, maintenance, reconciliation and analytics
//! - `reports`, `display`: Plain-text rendering
//! - `cli`: Command-line and shell handlers
//!
//! # Example
//!
//! ```rust
//! use ledger::ledger::Ledger;
//! use ledger::models::{CategoryType, Money};
//! use rust_decimal_macros::dec;
//!
//! let mut ledger = Ledger::in_memory();
//! let card = ledger.create_account("Card", Money::new(dec!(100), "RUB").unwrap(), "").unwrap();
//! let food = ledger.create_category(CategoryType::Expense, "Food", "").unwrap();
//! ledger.add_expense(card.id, Money::new(dec!(30), "RUB").unwrap(), food.id, "Lunch").unwrap();
//! ledger.undo().unwrap();
//! assert_eq!(ledger.accounts().get(card.id).unwrap().unwrap().balance, Money::new(dec!(100), "RUB").unwrap());
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod factory;
pub mod journal;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
