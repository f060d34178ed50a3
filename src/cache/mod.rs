//! Cache Module
//!
//! Tag-indexed invalidation on top of an opaque key/value backend.

mod backend;
mod entry;
mod facade;
mod file;
pub mod key;
pub mod records;
mod remote;
mod stats;
pub mod tags;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::Backend;
pub use entry::CacheEntry;
pub use facade::{build_backend, CacheFacade};
pub use file::LocalFileStore;
pub use remote::RemoteEntryStore;
pub use stats::{CounterAggregator, CounterKeys, CounterSnapshot};
pub use tags::TagMembers;

// == Public Constants ==
/// Keys this long (in characters) or longer are replaced by their SHA-1 digest
pub const MAX_KEY_LENGTH: usize = 225;
