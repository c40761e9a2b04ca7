//! Backend-agnostic error surface for the remote store.

use std::error::Error;
use thiserror::Error;

/// Result alias for remote storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by remote store adapters regardless of the backing service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed to respond.
    #[error("remote store unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failure.
        message: String,
        /// Underlying backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered but refused the operation.
    #[error("remote store rejected the operation: {message}")]
    Rejected {
        /// Human readable description of the rejection.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Construct a rejection without an underlying source error.
    pub fn rejected(message: impl Into<String>) -> Self {
        StorageError::Rejected {
            message: message.into(),
        }
    }
}
