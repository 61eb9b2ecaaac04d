use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum LookalikeError {
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Incompatible signature: expected {expected} components, got {got}")]
    IncompatibleSignature { expected: usize, got: usize },

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LookalikeError {
    /// Whether the caller may safely retry the same request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(StoreError::Unavailable(_)))
    }
}

pub type Result<T> = std::result::Result<T, LookalikeError>;
