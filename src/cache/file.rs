//! File-based key-value store with atomic writes.
//!
//! Stores one file per key under `dirs::data_dir()/<namespace>/`.
//! Uses temp file + rename for atomic writes.

use crate::cache::store::KeyValueStore;
use crate::PaywardenError;
use std::fs;
use std::path::PathBuf;

/// File-based key-value store.
pub struct FileStore {
    /// Directory holding one file per key.
    dir: PathBuf,
}

impl FileStore {
    /// Create a store under the platform data directory.
    pub fn new(namespace: &str) -> Result<Self, PaywardenError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| PaywardenError::StoreIO("Could not find data directory".to_string()))?;
        Self::with_path(base_dir.join(namespace))
    }

    /// Create a store at a specific directory.
    pub fn with_path(dir: PathBuf) -> Result<Self, PaywardenError> {
        fs::create_dir_all(&dir)
            .map_err(|e| PaywardenError::StoreIO(format!("Failed to create store dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.val", key_file_stem(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PaywardenError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| PaywardenError::StoreIO(format!("Failed to read {}: {}", key, e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PaywardenError> {
        let target_path = self.key_path(key);
        let temp_path = target_path.with_extension("tmp");

        fs::write(&temp_path, value)
            .map_err(|e| PaywardenError::StoreIO(format!("Failed to write temp file: {}", e)))?;
        fs::rename(&temp_path, &target_path)
            .map_err(|e| PaywardenError::StoreIO(format!("Failed to rename store file: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PaywardenError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| PaywardenError::StoreIO(format!("Failed to remove {}: {}", key, e)))?;
        }
        Ok(())
    }
}

/// File name stem for a key: first 16 hex chars of its SHA-256.
///
/// Keys may contain path separators or characters the filesystem rejects.
pub fn key_file_stem(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = hex::encode(Sha256::digest(key.as_bytes()));
    hash[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::CACHED_STATUS_KEY;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_set_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        store.set(CACHED_STATUS_KEY, "true").unwrap();
        assert_eq!(store.get(CACHED_STATUS_KEY).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_file_store_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_path(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(store.get("api_url").unwrap(), None);
    }

    #[test]
    fn test_file_store_overwrite_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_path(temp_dir.path().to_path_buf()).unwrap();

        store.set("use_mock_api", "true").unwrap();
        store.set("use_mock_api", "false").unwrap();
        assert_eq!(store.get("use_mock_api").unwrap().as_deref(), Some("false"));

        store.remove("use_mock_api").unwrap();
        store.remove("use_mock_api").unwrap();
        assert_eq!(store.get("use_mock_api").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileStore::with_path(temp_dir.path().to_path_buf()).unwrap();
            store.set("api_url", "https://api.example.com").unwrap();
        }
        let store = FileStore::with_path(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(
            store.get("api_url").unwrap().as_deref(),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn test_key_file_stem_is_path_safe() {
        let stem = key_file_stem("../../etc/passwd");
        assert_eq!(stem.len(), 16);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key_file_stem("a"), key_file_stem("b"));
    }
}
