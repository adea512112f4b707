//! Error types for request handling and store access
//!
//! [`CrudError`] covers requests rejected before any statement exists;
//! [`StoreError`] covers everything that goes wrong once the dispatcher
//! talks to a backing store. Neither reaches the transport: the dispatcher
//! renders both into the response record.

use std::time::Duration;
use thiserror::Error;

/// A request rejected before a statement was built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrudError {
    /// Required parameter missing or of the wrong shape
    #[error("{0}")]
    Validation(String),

    /// Operation name outside the recognized set
    #[error("Unknown operation '{0}'.")]
    UnknownOperation(String),
}

impl CrudError {
    pub fn validation(message: impl Into<String>) -> Self {
        CrudError::Validation(message.into())
    }
}

/// Failures talking to a backing store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not open a connection (network, auth, TLS, missing database)
    #[error("Connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// Opening a connection took longer than the connect timeout
    #[error("Connection failed: timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The store rejected the statement
    #[error("Execution failed: {0}")]
    Execute(#[source] sqlx::Error),

    /// The statement ran longer than the query timeout
    #[error("Execution failed: timed out after {0:?}")]
    QueryTimeout(Duration),

    /// A parameter could not be encoded for the driver
    #[error("Execution failed: could not bind parameter: {0}")]
    Bind(String),

    /// A configured name cannot be used as an SQL identifier
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl StoreError {
    /// True for failures that happened before a statement reached the store
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connect(_) | StoreError::ConnectTimeout(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operation_message() {
        let err = CrudError::UnknownOperation("upsert".to_string());
        assert_eq!(err.to_string(), "Unknown operation 'upsert'.");
    }

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::ConnectTimeout(Duration::from_secs(1)).is_connection());
        assert!(!StoreError::QueryTimeout(Duration::from_secs(1)).is_connection());
        assert!(!StoreError::Bind("bad".into()).is_connection());
    }
}
