//! # In-Memory Store
//!
//! Thread-safe, cloneable, process-local [`RecordStore`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::{validate_key, RecordStore, StoreError};

/// A `HashMap` of collection key to JSON document behind a `parking_lot`
/// read-write lock. Clones share the same map.
///
/// `parking_lot::RwLock` is non-poisonable, so a panicking writer does not
/// permanently wedge the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collections currently held.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no collection has been saved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        Ok(self.data.read().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        self.data.write().insert(key.to_string(), value.clone());
        tracing::debug!(key, "saved collection to memory store");
        Ok(())
    }
}
