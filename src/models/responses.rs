//! Response DTOs for the smash cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CounterSnapshot;

/// Response body for a lookup (GET /cache)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored payload, lossily decoded as UTF-8
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for a write (PUT /cache)
///
/// `written` is set for no-clobber adds, `overwritten` for replaces.
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    pub message: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwritten: Option<bool>,
}

impl StoreResponse {
    /// Outcome of a no-clobber add
    pub fn added(key: impl Into<String>, written: bool) -> Self {
        let key = key.into();
        let message = if written {
            format!("Key '{}' stored", key)
        } else {
            format!("Key '{}' not stored", key)
        };
        Self {
            message,
            key,
            written: Some(written),
            overwritten: None,
        }
    }

    /// Outcome of a replace
    pub fn replaced(key: impl Into<String>, overwritten: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' replaced", key),
            key,
            written: None,
            overwritten: Some(overwritten),
        }
    }
}

/// Response body for GET /exists
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for every sweep endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SmashResponse {
    /// Human readable summary
    pub message: String,
    /// Key, tag, prefix or namespace that was swept
    pub target: String,
}

impl SmashResponse {
    pub fn new(kind: &str, target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            message: format!("Smashed {} '{}'", kind, target),
            target,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub namespace: String,
    pub enabled: bool,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Objects created minus objects removed
    pub objects: u64,
    /// Lookups since the last counter flush
    pub pending_lookups: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a counter snapshot
    pub fn new(
        namespace: impl Into<String>,
        enabled: bool,
        snapshot: CounterSnapshot,
        pending_lookups: u64,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            enabled,
            hits: snapshot.hits,
            misses: snapshot.misses,
            objects: snapshot.objects,
            pending_lookups,
            hit_rate: snapshot.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
