//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{Cache, Tags, Ttl};
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HasResponse, HealthResponse, KeysResponse,
    MaintenanceResponse, SetRequest, SetResponse, StatsResponse, TagsQuery, TagsRequest,
    TagsResponse, TtlRequest, TtlResponse,
};

/// Cache engine shared by every handler, serialized behind one lock.
pub type SharedCache = Arc<RwLock<Cache<Value>>>;

/// Application state shared across all handlers.
///
/// Every operation that can load, expire or write through takes the write
/// lock; only pure in-memory introspection takes the read lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState with the given cache engine.
    pub fn new(cache: Cache<Value>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Runs `op` on a blocking thread while holding the write lock.
///
/// Engine calls may read or write the backing store, which for a disk store
/// means filesystem I/O.
async fn with_cache<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&mut Cache<Value>) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let mut cache = state.cache.clone().write_owned().await;
    tokio::task::spawn_blocking(move || op(&mut *cache))
        .await
        .map_err(|e| CacheError::Internal(format!("cache task failed: {}", e)))?
}

/// Handler for PUT /set
///
/// Stores a JSON value with optional TTL and tags. A null value is accepted
/// but not stored.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let SetRequest { key, value, ttl, tags } = req;
    let stored_key = key.clone();
    let stored = with_cache(&state, move |cache| {
        cache
            .set(stored_key, value, Ttl::from(ttl), Tags::from(tags))
            .map(|stored| stored.is_some())
    })
    .await?;

    Ok(Json(SetResponse::new(key, stored)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a read may load from the backing store or expire the entry
    let lookup = key.clone();
    let value = with_cache(&state, move |cache| cache.get(&lookup))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let target = key.clone();
    with_cache(&state, move |cache| cache.delete(&target)).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<HasResponse>> {
    let lookup = key.clone();
    let exists = with_cache(&state, move |cache| cache.has(&lookup)).await?;

    Ok(Json(HasResponse { key, exists }))
}

/// Handler for GET /ttl/:key
pub async fn get_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let lookup = key.clone();
    let ttl = with_cache(&state, move |cache| cache.get_ttl(&lookup))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(TtlResponse { key, ttl }))
}

/// Handler for PUT /ttl/:key
pub async fn set_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<TtlRequest>,
) -> Result<Json<TtlResponse>> {
    check_key(&key)?;
    let target = key.clone();
    let ttl = with_cache(&state, move |cache| {
        cache.set_ttl(&target, req.ttl)?.get_ttl(&target)
    })
    .await?
    .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(TtlResponse { key, ttl }))
}

/// Handler for PUT /tags/:key
pub async fn set_tags_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<TagsRequest>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;
    let target = key.clone();
    let value = with_cache(&state, move |cache| {
        if !cache.has(&target)? {
            return Ok(None);
        }
        cache.set_tags(&target, Tags::from(req.tags))?.get(&target)
    })
    .await?
    .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /tags?tags=a,b
///
/// Only entries currently loaded in memory are searched.
pub async fn get_tags_handler(
    State(state): State<AppState>,
    Query(query): Query<TagsQuery>,
) -> Json<TagsResponse> {
    let tags = query.to_tags();
    let cache = state.cache.read().await;
    let values = cache.get_tags(tags.clone());

    Json(TagsResponse {
        tags: tags.iter().map(str::to_string).collect(),
        values,
    })
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let cache = state.cache.read().await;
    let keys = cache.get_keys();

    Json(KeysResponse {
        count: keys.len(),
        keys,
    })
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<MaintenanceResponse>> {
    let removed = with_cache(&state, |cache| {
        let removed = cache.get_count();
        cache.clear();
        Ok(removed)
    })
    .await?;

    Ok(Json(MaintenanceResponse {
        message: "Cache cleared".to_string(),
        removed,
    }))
}

/// Handler for POST /expire
///
/// Runs the expiry sweep immediately.
pub async fn expire_handler(State(state): State<AppState>) -> Result<Json<MaintenanceResponse>> {
    let removed = with_cache(&state, |cache| {
        let before = cache.get_count();
        Ok(before - cache.delete_expired().get_count())
    })
    .await?;

    Ok(Json(MaintenanceResponse {
        message: format!("Removed {} expired entries", removed),
        removed,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
