//! Error types and result types for store operations.
//!
//! Every fallible operation in the store, the filter engine and the facade returns
//! [`StoreResult<T>`]. Failures are local to the call that produced them; nothing
//! here is retried.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required argument is missing or empty, e.g. fetching a record by an empty id.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation addresses an identifier that does not exist.
    ///
    /// Only updates report this. Reads return `None` and deletes succeed.
    #[error("Record {id} not found in collection {collection}")]
    NotFound {
        /// Name of the collection that was searched.
        collection: &'static str,
        /// The identifier that was not found.
        id: String,
    },
    /// A write payload could not be parsed as the expected record shape.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// A declarative filter uses an operator the engine does not know.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    /// Serialization/deserialization error when converting between BSON and JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Creates a [`StoreError::NotFound`] for the given collection and id.
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound { collection, id: id.into() }
    }

    /// Returns true if this is a [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
