//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value with optional TTL and tags
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /has/:key` - Check whether a key is present
//! - `GET /ttl/:key`, `PUT /ttl/:key` - Read or replace a key's TTL
//! - `PUT /tags/:key` - Replace a key's tags
//! - `GET /tags?tags=a,b` - Values of in-memory entries sharing a tag
//! - `GET /keys` - In-memory keys, oldest first
//! - `POST /clear` - Drop everything, including the backing store
//! - `POST /expire` - Run the expiry sweep now
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
