//! Request and Response models for the smash cache admin API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{KeyQuery, NamespaceQuery, PatternQuery, SmashQuery, StoreRequest, TagQuery};
pub use responses::{
    ErrorResponse, ExistsResponse, GetResponse, HealthResponse, SmashResponse, StatsResponse,
    StoreResponse,
};
