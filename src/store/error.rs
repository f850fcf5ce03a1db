//! Error taxonomy for the record store.
//!
//! Backend failures from SQLite are passed through unchanged; retry policy
//! belongs to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown identifier on retrieve/update.
    #[error("point not found in collection '{collection}': {id}")]
    NotFound { collection: String, id: String },

    /// The named collection has not been created.
    #[error("collection unavailable: {0}")]
    CollectionUnavailable(String),

    /// Vector width or distance metric incompatible with the target collection.
    #[error("schema mismatch on collection '{collection}': expected {expected}, got {got}")]
    SchemaMismatch {
        collection: String,
        expected: String,
        got: String,
    },

    /// Identifier does not match the required `<prefix>_<int>` pattern.
    #[error("invalid identifier '{0}': expected <prefix>_<int>")]
    InvalidIdentifier(String),

    /// Payload patch on `update_payload` was not a JSON object.
    #[error("payload patch for '{0}' must be a JSON object")]
    InvalidPatch(String),

    #[error(transparent)]
    Backend(#[from] rusqlite::Error),

    #[error("malformed payload for '{id}': {source}")]
    Payload {
        id: String,
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
