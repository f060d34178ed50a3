//! Smash Cache - tag-indexed invalidation over a key/value store
//!
//! Wraps a remote entry store or a local file tree with namespaced keys,
//! tag sweeps, prefix sweeps and periodically persisted hit/miss counters.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheFacade;
pub use config::Config;
pub use error::{Result, SmashError};
pub use tasks::spawn_purge_task;
