//! Error types and result types for document store operations.
//!
//! This module provides the error handling surface shared by every strata crate.
//! Use [`StoreResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the store.
///
/// This enum covers document lifecycle issues, collection and index management,
/// query population failures, and persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("document {0} not found in collection {1}")]
    DocumentNotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    /// A collection with the given name already exists in the store.
    #[error("collection already exists: {0}")]
    CollectionAlreadyExists(String),
    /// An index for the given field already exists on the collection.
    #[error("index already exists for field {0}")]
    IndexAlreadyExists(String),
    /// Inserting the document would leave two entries with an equal value
    /// in a unique index. The first argument is the indexed field, the
    /// second is the offending document ID.
    #[error("unique constraint violation on field {0} for document {1}")]
    UniqueViolation(String, String),
    /// A field path could not be resolved against a document payload.
    #[error("field not found: {0}")]
    FieldNotFound(String),
    /// Resolving a query population (join) failed. The first argument is
    /// the population field, the second describes the cause.
    #[error("population failed for field {0}: {1}")]
    Population(String, String),
    /// Serialization/deserialization error when encoding or decoding documents.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// A durable snapshot could not be written or read.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// A specialized `Result` type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<IoError> for StoreError {
    fn from(err: IoError) -> Self {
        StoreError::Persistence(err.to_string())
    }
}
