//! # dispute-store: Record Store
//!
//! The durable substrate underneath the dispute lifecycle. Its entire
//! contract is "collection key → JSON blob, synchronous get/set":
//!
//! - [`RecordStore`]: the trait the lifecycle manager is written against.
//! - [`MemoryStore`]: thread-safe in-process map, for tests and embedding.
//! - [`FileStore`]: one JSON file per key, replaced atomically on save.
//!
//! There are no transactions and no writer arbitration at this layer.
//! Conflict detection belongs to the caller (see `dispute-lifecycle`).

pub mod error;
pub mod file;
pub mod memory;

use std::sync::Arc;

use serde_json::Value;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable mapping from a collection key to a JSON document.
pub trait RecordStore: Send + Sync {
    /// Read the document stored under `key`, or `None` if nothing was ever
    /// saved there.
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the document stored under `key`.
    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

/// Collection keys become file names, so they are restricted to
/// `[A-Za-z0-9_-]` and must be non-empty.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
