//! Custom error types for the ledger
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Domain failures, command state misuse and
//! infrastructure failures share one enum so they can flow through the command
//! pipeline untouched.

use thiserror::Error;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Malformed or out-of-range field
    #[error("Validation error: {0}")]
    Validation(String),

    /// A business rule refused the operation (inactive account, same-account
    /// transfer, deleting a non-empty account)
    #[error("Domain rule violated: {0}")]
    DomainRule(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Insufficient funds
    #[error("Insufficient funds in account '{account}': need {requested}, have {available}")]
    InsufficientFunds {
        account: String,
        requested: String,
        available: String,
    },

    /// Command was executed twice without an undo in between
    #[error("Command already executed: {0}")]
    AlreadyExecuted(String),

    /// Undo requested for a command that has not run
    #[error("Command not executed: {0}")]
    NotExecuted(String),

    /// Undo requested for a command that cannot be undone
    #[error("Command cannot be undone: {0}")]
    NotUndoable(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A broken invariant inside the ledger itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for operations
    pub fn operation_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Operation",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a domain rule violation
    pub fn is_domain_rule(&self) -> bool {
        matches!(self, Self::DomainRule(_))
    }

    /// Check if this is an insufficient funds error
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::InsufficientFunds { .. })
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
