//! Service-layer error taxonomy.

use thiserror::Error;

use crate::{
    dao::{local_cache::CacheError, storage::StorageError},
    state::state_machine::DispatchError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Remote store call failed.
    #[error("remote store unavailable")]
    Unavailable(#[source] StorageError),
    /// No remote store is installed (degraded, local-only mode).
    #[error("remote store unavailable (degraded mode)")]
    Degraded,
    /// The state machine rejected the event.
    #[error("dispatch rejected")]
    Rejected(#[source] DispatchError),
    /// Local cache access failed.
    #[error("local cache failure")]
    Cache(#[source] CacheError),
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<DispatchError> for ServiceError {
    fn from(err: DispatchError) -> Self {
        ServiceError::Rejected(err)
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        ServiceError::Cache(err)
    }
}
