//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backing::{DiskStore, StoreResult};
use crate::cache::Cache;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Soft cap on estimated in-memory size in MiB, None = unbounded
    pub max_memory_mb: Option<usize>,
    /// Default TTL in seconds for entries stored without one, 0 = never expire
    pub default_ttl: u64,
    /// Disk backing store directory, None = memory only
    pub cache_dir: Option<PathBuf>,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_MEMORY_MB` - Memory cap in MiB (default: unbounded, 0 = unbounded)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 0, never expire)
    /// - `CACHE_DIR` - Enables the disk store at this directory
    /// - `DISK_CACHE` - `1`/`true` enables the disk store at `~/.xin_cache` when `CACHE_DIR` is unset
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_memory_mb: parse_var::<usize>("MAX_MEMORY_MB").filter(|mb| *mb > 0),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cache_dir: env::var_os("CACHE_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .or_else(|| {
                    flag_var("DISK_CACHE")
                        .then(|| DiskStore::default_dir().ok())
                        .flatten()
                }),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Builds a cache engine from this configuration, opening the disk store
    /// if one is configured.
    pub fn build_cache<V>(&self) -> StoreResult<Cache<V>>
    where
        V: Serialize + DeserializeOwned + Clone,
    {
        let mut cache = Cache::new().with_default_ttl(self.default_ttl);
        if let Some(mb) = self.max_memory_mb {
            cache = cache.with_max_memory_mb(mb);
        }
        if let Some(dir) = &self.cache_dir {
            cache = cache.with_backing_store(DiskStore::new(dir)?);
        }
        Ok(cache)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_memory_mb: None,
            default_ttl: 0,
            cache_dir: None,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn flag_var(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
