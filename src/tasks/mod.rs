//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry purge: drops expired entries from the backend at configured intervals

mod purge;

pub use purge::spawn_purge_task;
