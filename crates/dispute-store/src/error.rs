//! # Store Error Types

use thiserror::Error;

/// Errors raised by a [`RecordStore`](crate::RecordStore).
///
/// These are unrecoverable at the store layer and surface to the caller
/// unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying filesystem operation failed.
    #[error("I/O error on collection {key}: {source}")]
    Io {
        /// The collection key being read or written.
        key: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The stored bytes are not valid JSON, or the value could not be encoded.
    #[error("serialization error on collection {key}: {source}")]
    Serialization {
        /// The collection key being read or written.
        key: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The collection key contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid collection key: \"{0}\"")]
    InvalidKey(String),
}
