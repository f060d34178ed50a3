//! Backend Module
//!
//! The narrow capability interface the facade talks to. Each store variant
//! implements it; the facade checks capability flags instead of matching on
//! a store kind.

use std::fmt;
use std::time::Duration;

use crate::cache::{CounterKeys, CounterSnapshot};
use crate::error::{Result, SmashError};

// == Backend Trait ==
/// Key/value store consumed by the facade.
///
/// Only single-key operations are assumed atomic. Implementations must be
/// shareable across threads.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Whether `delete_prefix` is available.
    fn supports_prefix_delete(&self) -> bool;

    /// Whether tag entries may be stored and swept.
    fn supports_tags(&self) -> bool;

    /// True iff a live (non-expired) entry exists.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Returns the payload, or None on a miss.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Creates or overwrites an entry. `None` means the store default TTL.
    fn write(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Removes an entry; returns whether one was present.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every entry whose key starts with `prefix`; returns how many.
    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        Err(SmashError::UnsupportedCapability(format!(
            "{} store cannot delete by prefix '{}'",
            self.name(),
            prefix
        )))
    }

    /// Best-effort bulk clear of one namespace; returns entries removed.
    fn clear_namespace(&self, namespace: &str) -> Result<usize>;

    /// Persists the counters under their configured keys.
    ///
    /// The default writes each non-blank key as a decimal string entry.
    fn persist_counters(
        &self,
        _namespace: &str,
        keys: &CounterKeys,
        snapshot: &CounterSnapshot,
    ) -> Result<()> {
        let pairs = [
            (&keys.hit_key, snapshot.hits),
            (&keys.miss_key, snapshot.misses),
            (&keys.object_count_key, snapshot.objects),
        ];
        for (key, value) in pairs {
            if !key.trim().is_empty() {
                self.write(key, value.to_string().as_bytes(), None)?;
            }
        }
        Ok(())
    }

    /// Object count persisted by a previous run, if the store keeps one.
    fn load_object_count(&self, _namespace: &str) -> Result<Option<u64>> {
        Ok(None)
    }

    /// Drops expired entries; returns how many were removed.
    fn purge_expired(&self) -> Result<usize>;
}
