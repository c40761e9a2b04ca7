//! Error types shared by the PostgREST storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`PostgrestError`] failures.
pub type PostgrestResult<T> = Result<T, PostgrestError>;

/// Failures that can occur while talking to the PostgREST backend.
#[derive(Debug, Error)]
pub enum PostgrestError {
    /// Required environment variable is missing.
    #[error("missing PostgREST environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build PostgREST client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send PostgREST request to `{path}`")]
    RequestSend {
        /// Request path relative to the REST root.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend returned an unexpected status code.
    #[error("unexpected PostgREST response status {status} for `{path}`")]
    RequestStatus {
        /// Request path relative to the REST root.
        path: String,
        /// The offending status code.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected rows.
    #[error("failed to decode PostgREST response for `{path}`")]
    DecodeResponse {
        /// Request path relative to the REST root.
        path: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// A write expected to return its row came back empty.
    #[error("PostgREST returned no rows for `{path}`")]
    EmptyResponse {
        /// Request path relative to the REST root.
        path: String,
    },
}

impl From<PostgrestError> for StorageError {
    fn from(err: PostgrestError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
