use std::time::Duration;

use thiserror::Error;

use wicket_store::StoreError;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session must not last longer than {max:?}")]
    TtlTooLong { max: Duration },
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => SessionError::NotFound,
        }
    }
}
