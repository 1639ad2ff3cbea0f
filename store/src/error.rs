//! Store error types.

use thiserror::Error;

/// The only failure the store reports: the record is not there. Reads also
/// report it for records whose expiry has passed but which have not been
/// physically removed yet.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
}
