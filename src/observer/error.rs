use thiserror::Error;

use crate::store::StoreError;

/// Observer system errors with structured error types
#[derive(Debug, Error, Clone)]
pub enum ObserverError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),
}

/// Convert from storage errors
impl From<StoreError> for ObserverError {
    fn from(error: StoreError) -> Self {
        ObserverError::StorageError(error.to_string())
    }
}
