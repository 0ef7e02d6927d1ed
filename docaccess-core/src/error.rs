//! Error types and result types for document access operations.
//!
//! Every fallible operation returns [`AccessResult<T>`]. Driver errors are not
//! interpreted beyond the few categories callers need to branch on; their
//! message is carried through verbatim.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when accessing a document store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The store could not be reached or the connection string was rejected.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A textual object identifier is not 24 hexadecimal characters.
    #[error("Invalid object id {0:?}: {1}")]
    InvalidObjectId(String, String),
    /// A single-document read matched nothing.
    #[error("No document matched in {namespace}")]
    NotFound {
        /// The `database.collection` that was searched.
        namespace: String,
    },
    /// The store gave up on the operation after its time budget elapsed.
    #[error("Operation timed out: {0}")]
    Timeout(String),
    /// An error reported by the underlying store, passed through unmodified.
    #[error("Backend error: {0}")]
    Backend(String),
    /// The payload cannot be stored as given.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Conversion between BSON, JSON and [`Value`](crate::value::Value) failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The backend does not implement the requested filter or option.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl AccessError {
    /// Returns `true` if this error is the not-found condition of a single-document read.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound { .. })
    }
}

/// A specialized `Result` type for document access operations.
pub type AccessResult<T> = Result<T, AccessError>;

impl From<BsonError> for AccessError {
    fn from(err: BsonError) -> Self {
        AccessError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for AccessError {
    fn from(err: SerdeJsonError) -> Self {
        AccessError::Serialization(err.to_string())
    }
}
