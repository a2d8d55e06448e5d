//! Entity ids
//!
//! Every id is a random UUID. Users see it in a short prefixed form such as
//! `acc-1a2b3c4d` and may refer to an entity by that form, by the full UUID
//! or by any prefix of the UUID at least four characters long.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};

/// Shortest UUID prefix accepted as a reference
const MIN_REFERENCE_LEN: usize = 4;

/// Hex digits shown after the prefix
const SHORT_LEN: usize = 8;

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Whether a user-typed reference points at this id
            pub fn matches(&self, reference: &str) -> bool {
                matches_reference(&self.0, Self::PREFIX, reference)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", Self::PREFIX, &self.0.to_string()[..SHORT_LEN])
            }
        }
    };
}

ledger_id!(
    /// Identifies a bank account
    AccountId => "acc-"
);
ledger_id!(
    /// Identifies an income or expense category
    CategoryId => "cat-"
);
ledger_id!(
    /// Identifies a booked operation
    OperationId => "op-"
);

fn matches_reference(uuid: &Uuid, prefix: &str, reference: &str) -> bool {
    let reference = reference.trim();
    let bare = reference.strip_prefix(prefix).unwrap_or(reference).to_lowercase();
    bare.len() >= MIN_REFERENCE_LEN && uuid.to_string().starts_with(&bare)
}

/// The single item selected by `reference`
///
/// A short reference that fits more than one item is refused with a
/// validation error instead of picking one of them.
pub(crate) fn single_match<T>(
    items: impl IntoIterator<Item = T>,
    reference: &str,
    is_match: impl Fn(&T) -> bool,
) -> LedgerResult<Option<T>> {
    let mut found = items.into_iter().filter(|item| is_match(item));
    let first = found.next();
    let others = found.count();
    if others > 0 {
        return Err(LedgerError::Validation(format!(
            "'{}' matches {} entries; give more of the id",
            reference.trim(),
            others + 1
        )));
    }
    Ok(first)
}
