//! Unit-of-work layer

use tracing::error;

use crate::error::LedgerResult;
use crate::storage::UnitOfWork;

/// Bracket `f` with begin and commit; roll back and re-raise on error
///
/// A failing rollback is logged; the caller still sees the original error.
pub fn within_unit_of_work<T>(
    store: &dyn UnitOfWork,
    name: &str,
    f: impl FnOnce() -> LedgerResult<T>,
) -> LedgerResult<T> {
    store.begin()?;

    match f() {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = store.rollback() {
                error!(command = name, error = %rollback_error, "Rollback failed");
            }
            Err(e)
        }
    }
}
