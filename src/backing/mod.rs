//! Backing Store Module
//!
//! Durable key/value surfaces the cache engine writes through to.
//!
//! A backing store is a dumb map of opaque blobs: it knows nothing about
//! TTLs, tags or eviction. The engine owns entry encoding and all policy.

mod disk;
mod memory;

use std::fmt::Debug;
use std::path::PathBuf;

use thiserror::Error;

pub use disk::DiskStore;
pub use memory::MemoryStore;

// == Store Error ==
/// Failure raised by a backing store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure while touching `path`
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store cannot serve requests (poisoned lock, missing root, ...)
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for backing store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Backing Store ==
/// Contract for a durable key/value store behind the cache engine.
///
/// Blobs written through `set` must come back byte-for-byte from `get`.
/// Implementations are `Send + Sync` so an engine holding one can be shared
/// behind a lock across tasks.
pub trait BackingStore: Debug + Send + Sync {
    /// Persists `blob` under `key`, replacing any previous blob.
    fn set(&mut self, key: &str, blob: &[u8]) -> StoreResult<()>;

    /// Loads the blob stored under `key`, or `None` when nothing is stored.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Removes the blob stored under `key`. Deleting a missing key succeeds.
    fn delete(&mut self, key: &str) -> StoreResult<()>;

    /// Removes every persisted blob.
    fn clear(&mut self) -> StoreResult<()>;
}
