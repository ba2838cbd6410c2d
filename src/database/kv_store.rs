//! Key-value store abstraction
//!
//! Whole JSON blobs addressed by fixed key names. Views and services get a
//! store injected instead of reaching for global state.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Storage for string values under string keys
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing whatever was there
    fn set(&self, key: &str, value: String) -> StoreResult<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Every key currently held
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Read a JSON blob, falling back to `default` when it is absent or corrupt.
///
/// A missing key gets the default written back. A corrupt blob is left in
/// place and only logged.
pub fn load_json_or_default<T, F>(store: &dyn KeyValueStore, key: &str, default: F) -> StoreResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.get(key)? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored blob is unreadable, using defaults");
                Ok(default())
            }
        },
        None => {
            let value = default();
            save_json(store, key, &value)?;
            Ok(value)
        }
    }
}

/// Serialize and store a value under `key`
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        source: e,
    })?;
    store.set(key, raw)
}

/// Volatile store, used in tests and when no data directory is configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file is not a JSON object: {0}")]
    CorruptFile(#[source] serde_json::Error),

    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;
