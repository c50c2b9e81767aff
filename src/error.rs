//! Error types for the state store.

use thiserror::Error;

/// Main error type for store and value operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store \"{0}\" has already been initialized. Hard reset the store to reinitialize it.")]
    AlreadyInitialized(String),

    #[error("Store \"{0}\" can't be modified before it was initialized")]
    NotInitialized(String),

    #[error("Store \"{0}\" is not configured as resettable")]
    NotResettable(String),

    #[error("Store name \"{0}\" is not unique")]
    DuplicateName(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage key \"{key}\" in store \"{store}\" is not unique")]
    DuplicateStorageKey { key: String, store: String },

    #[error("Attempted to modify a frozen value: {0}")]
    ImmutableMutation(String),

    #[error("Index {index} is too far past the end of an array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid date component: {0}")]
    InvalidDate(String),

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage directory is locked by another process")]
    Locked,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Store \"{0}\" has been destroyed")]
    Destroyed(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            StoreError::Deserialization(e.to_string())
        } else {
            StoreError::Serialization(e.to_string())
        }
    }
}

/// Failure of an asynchronous initialization.
///
/// `Rejected` carries the (possibly translated) error produced by the awaited
/// future; `Store` carries a lifecycle violation detected by the store itself.
#[derive(Debug, Error)]
pub enum AsyncInitError<E> {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Asynchronous initialization was rejected: {0:?}")]
    Rejected(E),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
