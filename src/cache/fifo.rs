//! FIFO Tracker Module
//!
//! Tracks first-insertion order of keys for oldest-first eviction.

use std::collections::{HashMap, VecDeque};

// == FIFO Tracker ==
/// Tracks insertion order for FIFO eviction.
///
/// Keys are queued as `(key, sequence)` pairs:
/// - Front = oldest insertion
/// - Back = newest insertion
///
/// Removal only drops the key from `live`; the queued pair becomes stale and
/// is skipped when iterated. This keeps insert and remove O(1) amortized.
/// The queue is compacted once stale pairs outnumber live keys.
#[derive(Debug, Default)]
pub struct FifoTracker {
    /// Keys in insertion order, possibly including stale pairs
    order: VecDeque<(String, u64)>,
    /// Live keys mapped to the sequence number of their queued pair
    live: HashMap<String, u64>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl FifoTracker {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Records `key` as newest unless it is already tracked.
    ///
    /// Re-inserting a tracked key keeps its original position.
    pub fn insert(&mut self, key: &str) {
        if self.live.contains_key(key) {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(key.to_string(), seq);
        self.order.push_back((key.to_string(), seq));
    }

    // == Remove ==
    /// Stops tracking a key.
    pub fn remove(&mut self, key: &str) {
        if self.live.remove(key).is_some() {
            self.maybe_compact();
        }
    }

    // == Iterate ==
    /// Iterates live keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|(key, seq)| self.is_current(key, *seq))
            .map(|(key, _)| key.as_str())
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
        self.live.clear();
    }

    fn is_current(&self, key: &str, seq: u64) -> bool {
        self.live.get(key) == Some(&seq)
    }

    fn maybe_compact(&mut self) {
        if self.order.len() > 2 * self.live.len() + 16 {
            let live = &self.live;
            self.order.retain(|(key, seq)| live.get(key) == Some(seq));
        }
    }
}
