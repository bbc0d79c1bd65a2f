//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::Cache;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep takes the write lock and calls
/// [`Cache::delete_expired`], which also removes the swept keys from the
/// backing store.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(Cache::<Value>::new()));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(cache: Arc<RwLock<Cache<V>>>, cleanup_interval_secs: u64) -> JoinHandle<()>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            // The sweep may delete files from a disk store.
            let mut cache_guard = cache.clone().write_owned().await;
            let sweep = tokio::task::spawn_blocking(move || {
                let before = cache_guard.get_count();
                cache_guard.delete_expired();
                before - cache_guard.get_count()
            });
            let removed = match sweep.await {
                Ok(removed) => removed,
                Err(e) => {
                    warn!("Expiry sweep failed: {}", e);
                    continue;
                }
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
