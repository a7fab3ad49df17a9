//! # File Store
//!
//! Stores each collection as `<root>/<key>.json`. Saves write a temporary
//! file in the same directory and rename it over the target, so a reader
//! sees either the previous document or the new one, never a torn write.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::{validate_key, RecordStore, StoreError};

/// A directory of JSON documents, one per collection key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl RecordStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        };
        tracing::debug!(key, bytes = bytes.len(), path = %path.display(), "loaded collection");
        let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        let path = self.path_for(key);
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        tracing::debug!(key, bytes = bytes.len(), path = %path.display(), "saved collection");
        Ok(())
    }
}
