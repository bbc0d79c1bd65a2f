//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and tag support.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Tags;

/// `get_ttl` result for an entry that never expires.
pub const NO_EXPIRY: i64 = -1;

// == TTL ==
/// Requested lifetime of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the engine's default TTL, or never expire if none is configured
    #[default]
    Default,
    /// Never expire
    Never,
    /// Expire after this many seconds; `Seconds(0)` never expires
    Seconds(u64),
}

impl Ttl {
    /// Resolves this TTL to an absolute deadline relative to `now`.
    ///
    /// A default TTL of zero is treated as unset. Deadlines beyond the
    /// representable range are treated as "never".
    pub fn expires_at(self, default_ttl: Option<u64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let seconds = match self {
            Ttl::Default => default_ttl?,
            Ttl::Never => return None,
            Ttl::Seconds(seconds) => seconds,
        };
        if seconds == 0 {
            return None;
        }
        let seconds = i64::try_from(seconds).ok()?;
        Duration::try_seconds(seconds).and_then(|delta| now.checked_add_signed(delta))
    }
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Ttl::Seconds(seconds)
    }
}

impl From<Option<u64>> for Ttl {
    fn from(seconds: Option<u64>) -> Self {
        seconds.map(Ttl::Seconds).unwrap_or_default()
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// This is also the unit written through to the backing store, so the
/// persisted form carries data, tags and the absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub data: V,
    /// Labels for grouped retrieval
    #[serde(default)]
    pub tags: Tags,
    /// Absolute expiry, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
    /// Estimated in-memory footprint, recomputed whenever the entry is stored
    #[serde(skip)]
    pub(crate) size: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(data: V, tags: Tags, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            data,
            tags,
            expires_at,
            size: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline, so a
    /// TTL of N seconds is gone as soon as N full seconds have elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining_ms(&self) -> Option<i64> {
        self.expires_at
            .map(|expires| (expires - Utc::now()).num_milliseconds().max(0))
    }

    /// Returns remaining TTL in whole seconds, rounded up.
    ///
    /// A freshly stored 10 second entry reports 10 rather than 9.
    pub fn ttl_remaining(&self) -> Option<i64> {
        self.ttl_remaining_ms().map(|ms| (ms + 999) / 1000)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn entry_with_ttl(ttl: Ttl) -> CacheEntry<String> {
        let expires_at = ttl.expires_at(None, Utc::now());
        CacheEntry::new("test_value".to_string(), Tags::none(), expires_at)
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = entry_with_ttl(Ttl::Never);

        assert_eq!(entry.data, "test_value");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = entry_with_ttl(Ttl::Seconds(60));

        assert!(entry.expires_at.is_some());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = entry_with_ttl(Ttl::Seconds(1));

        assert!(!entry.is_expired());

        sleep(StdDuration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        assert_eq!(Ttl::Seconds(0).expires_at(Some(30), Utc::now()), None);
        assert_eq!(Ttl::Never.expires_at(Some(30), Utc::now()), None);
    }

    #[test]
    fn test_default_ttl_resolution() {
        let now = Utc::now();
        assert_eq!(
            Ttl::Default.expires_at(Some(30), now),
            Some(now + Duration::seconds(30))
        );
        assert_eq!(Ttl::Default.expires_at(None, now), None);
        assert_eq!(Ttl::Default.expires_at(Some(0), now), None);
    }

    #[test]
    fn test_explicit_ttl_overrides_default() {
        let now = Utc::now();
        assert_eq!(
            Ttl::Seconds(5).expires_at(Some(30), now),
            Some(now + Duration::seconds(5))
        );
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        assert_eq!(Ttl::Seconds(u64::MAX).expires_at(None, Utc::now()), None);
    }

    #[test]
    fn test_ttl_from_option() {
        assert_eq!(Ttl::from(None), Ttl::Default);
        assert_eq!(Ttl::from(Some(7)), Ttl::Seconds(7));
        assert_eq!(Ttl::from(0), Ttl::Seconds(0));
    }

    #[test]
    fn test_ttl_remaining_seconds() {
        let entry = entry_with_ttl(Ttl::Seconds(10));

        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= 10);
        assert!(remaining >= 9);
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        let entry = entry_with_ttl(Ttl::Never);

        assert!(entry.ttl_remaining().is_none());
        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = entry_with_ttl(Ttl::Seconds(1));

        sleep(StdDuration::from_millis(1100));

        assert_eq!(entry.ttl_remaining().unwrap(), 0);
        assert_eq!(entry.ttl_remaining_ms().unwrap(), 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Utc::now();
        let entry = CacheEntry::new("test".to_string(), Tags::none(), Some(now));

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - Duration::milliseconds(1)));
    }

    #[test]
    fn test_entry_serde_skips_size() {
        let mut entry = CacheEntry::new(42u32, Tags::from("n"), None);
        entry.size = 128;

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("size"));

        let back: CacheEntry<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, 42);
        assert!(back.tags.contains("n"));
        assert_eq!(back.size, 0);
    }
}
