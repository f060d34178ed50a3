//! Request DTOs for the smash cache admin API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Request body for storing a value (PUT /cache)
///
/// # Fields
/// - `key`: The cache key, usually a request path with its query string
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds (uses the configured default if absent)
/// - `tags`: Tags to record the key under for group sweeping
/// - `replace`: Overwrite an existing entry instead of keeping it
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub replace: bool,
}

impl StoreRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Some("Tags cannot be blank".to_string());
        }
        None
    }
}

/// `?key=` for lookups
#[derive(Debug, Clone, Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

/// `?key=&wide_net_flush=` for single-key sweeps
#[derive(Debug, Clone, Deserialize)]
pub struct SmashQuery {
    pub key: String,
    #[serde(default)]
    pub wide_net_flush: Option<bool>,
}

/// `?tag=` for tag sweeps
#[derive(Debug, Clone, Deserialize)]
pub struct TagQuery {
    pub tag: String,
}

/// `?prefix=` for pattern sweeps
#[derive(Debug, Clone, Deserialize)]
pub struct PatternQuery {
    pub prefix: String,
}

/// `?namespace=` for namespace clears; absent means the default namespace
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceQuery {
    #[serde(default)]
    pub namespace: Option<String>,
}
