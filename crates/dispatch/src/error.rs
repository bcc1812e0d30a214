use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("assignment batch has no orders")]
    EmptyBatch,

    #[error("no eligible drivers for store {0}")]
    NoEligibleDrivers(String),
}
