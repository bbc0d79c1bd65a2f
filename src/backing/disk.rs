//! Disk Store Module
//!
//! File-per-entry backing store, content-addressed by the key's xxh3 digest
//! and sharded into two-character subdirectories.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_128;

use super::{BackingStore, StoreError, StoreResult};

/// Directory name used under the home directory when no path is given.
pub const DEFAULT_DIR_NAME: &str = ".xin_cache";

/// Digest slice naming the shard directory.
const SHARD_RANGE: std::ops::Range<usize> = 6..8;

// == Disk Store ==
/// Persists each entry blob as one file under a sharded directory tree.
///
/// Layout: `<root>/<digest[6..8]>/<digest>` where `digest` is the 32-char
/// lowercase hex xxh3-128 of the key.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    // == Constructor ==
    /// Opens a disk store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        debug!("Disk store opened at {}", root.display());
        Ok(Self { root })
    }

    /// Returns `$HOME/.xin_cache`.
    pub fn default_dir() -> StoreResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_DIR_NAME))
            .ok_or_else(|| StoreError::Unavailable("cannot resolve home directory".to_string()))
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // == Paths ==
    /// Returns the file path an entry for `key` is stored at.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = key_digest(key);
        self.root.join(&digest[SHARD_RANGE]).join(digest)
    }

    /// Returns true if a blob for `key` exists on disk.
    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }
}

impl BackingStore for DiskStore {
    fn set(&mut self, key: &str, blob: &[u8]) -> StoreResult<()> {
        let path = self.entry_path(key);
        if let Some(shard) = path.parent() {
            fs::create_dir_all(shard).map_err(|e| StoreError::io(shard, e))?;
        }
        fs::write(&path, blob).map_err(|e| StoreError::io(&path, e))
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Removes everything under the root. A child that cannot be removed is
    /// logged and skipped; only an unreadable root is reported.
    fn clear(&mut self) -> StoreResult<()> {
        let children = match fs::read_dir(&self.root) {
            Ok(children) => children,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        for child in children {
            let child = match child {
                Ok(child) => child,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };
            let path = child.path();
            let removed = match child.file_type() {
                Ok(kind) if kind.is_dir() => fs::remove_dir_all(&path),
                Ok(_) => fs::remove_file(&path),
                Err(e) => Err(e),
            };
            if let Err(e) = removed {
                warn!("Failed to remove cache file {}: {}", path.display(), e);
            }
        }
        Ok(())
    }
}

/// Lowercase hex xxh3-128 digest of `key`.
fn key_digest(key: &str) -> String {
    format!("{:032x}", xxh3_128(key.as_bytes()))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, DiskStore) {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path().join("cache")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_creates_root() {
        let (_dir, store) = open_store();
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_key_digest_is_stable_hex() {
        let digest = key_digest("user:42");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(digest, key_digest("user:42"));
        assert_ne!(digest, key_digest("user:43"));
    }

    #[test]
    fn test_entry_path_is_sharded() {
        let (_dir, store) = open_store();
        let digest = key_digest("alpha");
        let path = store.entry_path("alpha");

        assert_eq!(path.file_name().unwrap().to_str().unwrap(), digest);
        let shard = path.parent().unwrap();
        assert_eq!(shard.file_name().unwrap().to_str().unwrap(), &digest[6..8]);
        assert_eq!(shard.parent().unwrap(), store.root());
    }

    #[test]
    fn test_set_get_delete() {
        let (_dir, mut store) = open_store();

        store.set("k", b"payload").unwrap();
        assert!(store.contains("k"));
        assert_eq!(store.get("k").unwrap(), Some(b"payload".to_vec()));

        store.delete("k").unwrap();
        assert!(!store.contains("k"));
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (_dir, store) = open_store();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_dir, mut store) = open_store();
        assert!(store.delete("missing").is_ok());
    }

    #[test]
    fn test_set_overwrites() {
        let (_dir, mut store) = open_store();
        store.set("k", b"one").unwrap();
        store.set("k", b"two").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (_dir, mut store) = open_store();
        for i in 0..20 {
            store.set(&format!("key{}", i), b"v").unwrap();
        }
        fs::write(store.root().join("stray.txt"), b"x").unwrap();

        store.clear().unwrap();

        assert!(store.root().is_dir());
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
        assert_eq!(store.get("key3").unwrap(), None);
    }

    #[test]
    fn test_clear_missing_root_is_ok() {
        let (_dir, mut store) = open_store();
        fs::remove_dir_all(store.root()).unwrap();
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_stores_share_directory() {
        let (_dir, mut store) = open_store();
        store.set("shared", b"data").unwrap();

        let reopened = DiskStore::new(store.root().to_path_buf()).unwrap();
        assert_eq!(reopened.get("shared").unwrap(), Some(b"data".to_vec()));
    }
}
