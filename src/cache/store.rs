//! Key-value store seam and the in-memory implementation.

use crate::PaywardenError;
use std::collections::HashMap;
use std::sync::RwLock;

/// Store key for the last-known subscription status.
pub const CACHED_STATUS_KEY: &str = "cached_subscription_status";

/// Persistent string key-value store (AsyncStorage, SharedPreferences, files).
///
/// Reads are synchronous so the cold-start status is one call away.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, PaywardenError>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), PaywardenError>;

    /// Remove a value. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), PaywardenError>;
}

/// In-memory store for tests and run targets without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PaywardenError> {
        let values = self
            .values
            .read()
            .map_err(|_| PaywardenError::StoreIO("memory store lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PaywardenError> {
        let mut values = self
            .values
            .write()
            .map_err(|_| PaywardenError::StoreIO("memory store lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PaywardenError> {
        let mut values = self
            .values
            .write()
            .map_err(|_| PaywardenError::StoreIO("memory store lock poisoned".to_string()))?;
        values.remove(key);
        Ok(())
    }
}
