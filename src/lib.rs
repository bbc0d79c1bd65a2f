//! Xin Cache - A process-local key/value cache
//!
//! Stores serializable values under string keys with optional TTL and tags,
//! evicts oldest-inserted entries under a memory cap, and writes every
//! mutation through to an optional backing store so entries survive restarts.
//!
//! ```ignore
//! use xin_cache::{Cache, DiskStore, Ttl};
//!
//! let mut cache = Cache::new()
//!     .with_default_ttl(300)
//!     .with_backing_store(DiskStore::new("/tmp/xin_cache")?);
//! cache.set("user:1", "ada".to_string(), Ttl::Seconds(60), ["users"])?;
//! assert_eq!(cache.get("user:1")?, Some("ada".to_string()));
//! ```

pub mod api;
pub mod backing;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backing::{BackingStore, DiskStore, MemoryStore, StoreError};
pub use cache::{Cache, CacheStats, Tags, Ttl, NO_EXPIRY};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
