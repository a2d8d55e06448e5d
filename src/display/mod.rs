//! Display formatting for terminal output
//!
//! Plain-text tables and detail views of accounts, categories and
//! operations.

pub mod account;
pub mod category;
pub mod operation;

pub use account::{format_account_details, format_account_list};
pub use category::{format_category_details, format_category_list};
pub use operation::{format_operation_details, format_operation_list, NameLookup};
