//! Category model
//!
//! Categories classify operations as income or expense. They are tags only:
//! an operation references a category, a category never owns operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CategoryId;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 200;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_ICON: &str = "default";

/// Whether a category (or operation) brings money in or takes it out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    /// Parse a category type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

/// A classification tag for operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    #[serde(rename = "type")]
    pub category_type: CategoryType,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Hex colour, `#RGB` or `#RRGGBB`
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl Category {
    /// Create a new category with default colour and icon
    pub fn new(
        category_type: CategoryType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: CategoryId::new(),
            category_type,
            name: name.into(),
            description: description.into(),
            color: default_color(),
            icon: default_icon(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.category_type == CategoryType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.category_type == CategoryType::Expense
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        let len = self.name.chars().count();
        if len > MAX_NAME_LENGTH {
            return Err(CategoryValidationError::NameTooLong(len));
        }
        let len = self.description.chars().count();
        if len > MAX_DESCRIPTION_LENGTH {
            return Err(CategoryValidationError::DescriptionTooLong(len));
        }
        if !is_hex_color(&self.color) {
            return Err(CategoryValidationError::InvalidColor(self.color.clone()));
        }
        if self.icon.trim().is_empty() {
            return Err(CategoryValidationError::EmptyIcon);
        }
        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category_type)
    }
}

/// `#RGB` or `#RRGGBB`
fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    DescriptionTooLong(usize),
    InvalidColor(String),
    EmptyIcon,
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Category name too long ({} chars, max {})",
                len, MAX_NAME_LENGTH
            ),
            Self::DescriptionTooLong(len) => write!(
                f,
                "Category description too long ({} chars, max {})",
                len, MAX_DESCRIPTION_LENGTH
            ),
            Self::InvalidColor(color) => {
                write!(f, "Invalid color '{}': expected #RGB or #RRGGBB", color)
            }
            Self::EmptyIcon => write!(f, "Category icon cannot be empty"),
        }
    }
}

impl std::error::Error for CategoryValidationError {}

impl From<CategoryValidationError> for crate::error::LedgerError {
    fn from(err: CategoryValidationError) -> Self {
        crate::error::LedgerError::Validation(err.to_string())
    }
}
