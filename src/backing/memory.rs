//! Memory Store Module
//!
//! Backing store kept in process memory. Clones share the same map, which
//! lets a fresh engine observe what an earlier engine persisted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{BackingStore, StoreError, StoreResult};

// == Memory Store ==
/// Shared in-memory map of blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently persisted.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a blob is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(key))
            .unwrap_or(false)
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

impl BackingStore for MemoryStore {
    fn set(&mut self, key: &str, blob: &[u8]) -> StoreResult<()> {
        self.blobs
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().map_err(poisoned)?.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.blobs.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.blobs.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        store.set("k", b"v").unwrap();

        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert!(store.contains("k"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_delete_and_clear() {
        let mut store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        store.set("b", b"2").unwrap();

        store.delete("a").unwrap();
        store.delete("missing").unwrap();
        assert!(!store.contains("a"));
        assert_eq!(store.len(), 1);

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_data() {
        let mut store = MemoryStore::new();
        let other = store.clone();

        store.set("shared", b"x").unwrap();
        assert_eq!(other.get("shared").unwrap(), Some(b"x".to_vec()));
    }
}
