//! Cache Module
//!
//! Provides the in-memory cache engine with TTL expiration, tag lookup,
//! FIFO eviction and write-through persistence.

mod engine;
mod entry;
mod fifo;
mod stats;
mod tags;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use engine::{Cache, ENTRY_OVERHEAD};
pub use entry::{CacheEntry, Ttl, NO_EXPIRY};
pub use fifo::FifoTracker;
pub use stats::CacheStats;
pub use tags::Tags;

// == Public Constants ==
/// Maximum allowed key length in bytes, enforced by the HTTP layer
pub const MAX_KEY_LENGTH: usize = 256;
