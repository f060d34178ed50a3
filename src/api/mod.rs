//! API Module
//!
//! HTTP handlers and routing for the smash cache admin API.
//!
//! # Endpoints
//! - `PUT /cache` - Add or replace a value
//! - `GET /cache?key=` - Look up a value
//! - `DELETE /cache?key=` - Smash a key
//! - `GET /exists?key=` - Check for a live entry
//! - `DELETE /tags?tag=` - Smash a tag
//! - `DELETE /pattern?prefix=` - Smash a prefix
//! - `DELETE /namespace?namespace=` - Smash a namespace
//! - `GET /stats` - Counter snapshot
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
