//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document exceeds the store's hard per-record limit.
    #[error("document {path} is {size} bytes, store limit is {limit} bytes")]
    RecordTooLarge {
        /// The offending document.
        path: String,
        /// Encoded size of the document.
        size: usize,
        /// The store's hard limit.
        limit: usize,
    },

    /// The store could not be reached or refused the request
    /// (network, quota, permission).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be interpreted by the store.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
