//! API Handlers
//!
//! HTTP request handlers for each smash cache admin endpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::CacheFacade;
use crate::config::Config;
use crate::error::{Result, SmashError};
use crate::models::{
    ExistsResponse, GetResponse, HealthResponse, KeyQuery, NamespaceQuery, PatternQuery,
    SmashQuery, SmashResponse, StatsResponse, StoreRequest, StoreResponse, TagQuery,
};

/// Application state shared across all handlers.
///
/// Every facade operation that counts lookups or objects needs `&mut`, so
/// the facade sits behind a mutex rather than a read/write lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<Mutex<CacheFacade>>,
}

impl AppState {
    /// Creates a new AppState around an existing facade.
    pub fn new(cache: CacheFacade) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheFacade::from_config(config.clone()))
    }
}

/// Handler for PUT /cache
///
/// Adds the value, or overwrites it when `replace` is set.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(SmashError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    let mut cache = state.cache.lock().await;
    let response = if req.replace {
        let overwritten = cache.replace(&req.key, req.value.as_bytes(), ttl, req.tags.as_slice());
        StoreResponse::replaced(req.key, overwritten)
    } else {
        let written = cache.add(&req.key, req.value.as_bytes(), ttl, req.tags.as_slice());
        StoreResponse::added(req.key, written)
    };

    Ok(Json(response))
}

/// Handler for GET /cache?key=
pub async fn find_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    let mut cache = state.cache.lock().await;
    match cache.find(&query.key) {
        Some(payload) => {
            let value = String::from_utf8_lossy(&payload).into_owned();
            Ok(Json(GetResponse::new(query.key, value)))
        }
        None => Err(SmashError::NotFound(query.key)),
    }
}

/// Handler for GET /exists?key=
pub async fn exists_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Json<ExistsResponse> {
    let cache = state.cache.lock().await;
    let exists = cache.exists(&query.key);
    Json(ExistsResponse {
        key: query.key,
        exists,
    })
}

/// Handler for DELETE /cache?key=&wide_net_flush=
pub async fn smash_handler(
    State(state): State<AppState>,
    Query(query): Query<SmashQuery>,
) -> Json<SmashResponse> {
    let mut cache = state.cache.lock().await;
    cache.smash(&query.key, query.wide_net_flush);
    Json(SmashResponse::new("key", query.key))
}

/// Handler for DELETE /tags?tag=
pub async fn smash_tag_handler(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Json<SmashResponse> {
    let mut cache = state.cache.lock().await;
    cache.smash_by_tag(&query.tag);
    Json(SmashResponse::new("tag", query.tag))
}

/// Handler for DELETE /pattern?prefix=
pub async fn smash_pattern_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Json<SmashResponse> {
    let mut cache = state.cache.lock().await;
    cache.smash_by_pattern(&query.prefix);
    Json(SmashResponse::new("pattern", query.prefix))
}

/// Handler for DELETE /namespace?namespace=
///
/// Clears the default namespace when none is given.
pub async fn smash_namespace_handler(
    State(state): State<AppState>,
    Query(query): Query<NamespaceQuery>,
) -> Json<SmashResponse> {
    let mut cache = state.cache.lock().await;
    let namespace = query
        .namespace
        .filter(|ns| !ns.trim().is_empty())
        .unwrap_or_else(|| cache.namespace().to_string());
    cache.smash_the_cache(Some(&namespace));
    Json(SmashResponse::new("namespace", namespace))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.lock().await;
    Json(StatsResponse::new(
        cache.namespace(),
        cache.is_enabled(),
        cache.stats(),
        cache.pending_lookups(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
