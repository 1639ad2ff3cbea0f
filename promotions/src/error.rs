use std::time::Duration;

use thiserror::Error;

use wicket_store::StoreError;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PromotionError {
    #[error("promotion pass not found")]
    NotFound,

    #[error("promotion pass must not last longer than {max:?}")]
    TtlTooLong { max: Duration },
}

impl From<StoreError> for PromotionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => PromotionError::NotFound,
        }
    }
}
