//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, expire_handler, get_handler, get_tags_handler,
    get_ttl_handler, has_handler, health_handler, keys_handler, set_handler, set_tags_handler,
    set_ttl_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/has/:key", get(has_handler))
        .route("/ttl/:key", get(get_ttl_handler).put(set_ttl_handler))
        .route("/tags/:key", put(set_tags_handler))
        .route("/tags", get(get_tags_handler))
        .route("/keys", get(keys_handler))
        .route("/clear", post(clear_handler))
        .route("/expire", post(expire_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
