use thiserror::Error;

use crate::store::StoreError;
use crate::tasks::ValidationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Document with the requested ID could not be found.")]
    NotFound { id: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for InternError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id } => InternError::NotFound { id },
            other => InternError::Store(other),
        }
    }
}
