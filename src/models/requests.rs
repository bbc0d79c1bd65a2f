//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{Tags, MAX_KEY_LENGTH};

/// Tag input accepted on the wire: a single label or a list of labels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    One(String),
    Many(Vec<String>),
}

impl From<TagInput> for Tags {
    fn from(input: TagInput) -> Self {
        match input {
            TagInput::One(tag) => Tags::from(tag),
            TagInput::Many(tags) => Tags::from(tags),
        }
    }
}

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value; `null` is accepted but not stored
/// - `ttl`: Optional TTL in seconds, 0 = never expire (uses default if not specified)
/// - `tags`: Optional tag or list of tags
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub tags: Option<TagInput>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for PUT /ttl/:key
#[derive(Debug, Clone, Deserialize)]
pub struct TtlRequest {
    /// New TTL in seconds, 0 = never expire
    pub ttl: u64,
}

/// Request body for PUT /tags/:key
#[derive(Debug, Clone, Deserialize)]
pub struct TagsRequest {
    #[serde(default)]
    pub tags: Option<TagInput>,
}

/// Query string for GET /tags
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsQuery {
    /// Comma-separated tag labels
    #[serde(default)]
    pub tags: String,
}

impl TagsQuery {
    pub fn to_tags(&self) -> Tags {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Returns an error message if `key` is not an acceptable cache key.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
