//! Remote Entry Store Module
//!
//! Shared key/value store standing in for a remote cache service. Every
//! clone sees the same entries, the way every process sees one service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::{key, Backend, CacheEntry};
use crate::error::{Result, SmashError};

// == Remote Entry Store ==
/// Distributed-style entry store with per-entry TTL.
#[derive(Debug, Clone)]
pub struct RemoteEntryStore {
    /// Key-value storage shared by every clone
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// TTL applied when a write passes none
    default_ttl: Option<Duration>,
    /// Whether the service can scan keys for prefix deletes
    prefix_delete: bool,
}

impl RemoteEntryStore {
    // == Constructor ==
    /// Creates a store that supports prefix deletes.
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
            prefix_delete: true,
        }
    }

    /// Creates a store whose service cannot scan keys (memcached-style);
    /// callers fall back to tags for group invalidation.
    pub fn without_prefix_delete(default_ttl: Option<Duration>) -> Self {
        Self {
            prefix_delete: false,
            ..Self::new(default_ttl)
        }
    }

    /// Same entries, different prefix-delete capability.
    pub fn with_prefix_delete(mut self, enabled: bool) -> Self {
        self.prefix_delete = enabled;
        self
    }

    // == Length ==
    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn remove_matching(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }
}

impl Backend for RemoteEntryStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn supports_prefix_delete(&self) -> bool {
        self.prefix_delete
    }

    fn supports_tags(&self) -> bool {
        true
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .entries
            .read()
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false))
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.filter(|ttl| !ttl.is_zero()).or(self.default_ttl);
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        if !self.prefix_delete {
            return Err(SmashError::UnsupportedCapability(format!(
                "remote store cannot delete by prefix '{}'",
                prefix
            )));
        }
        Ok(self.remove_matching(prefix))
    }

    fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        // Namespace clears are a server-side bulk op even where callers
        // cannot scan keys themselves.
        Ok(self.remove_matching(&key::namespace_root(namespace)))
    }

    fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        Ok(before - entries.len())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_store_write_and_read() {
        let store = RemoteEntryStore::new(None);

        store.write("/ns/key1", b"value1", None).unwrap();

        assert_eq!(store.read("/ns/key1").unwrap(), Some(b"value1".to_vec()));
        assert!(store.exists("/ns/key1").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_read_missing() {
        let store = RemoteEntryStore::new(None);
        assert_eq!(store.read("/ns/nope").unwrap(), None);
        assert!(!store.exists("/ns/nope").unwrap());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = RemoteEntryStore::new(None);
        let other = store.clone();

        store.write("/ns/shared", b"v", None).unwrap();
        assert!(other.exists("/ns/shared").unwrap());
    }

    #[test]
    fn test_delete_reports_presence() {
        let store = RemoteEntryStore::new(None);
        store.write("/ns/key1", b"v", None).unwrap();

        assert!(store.delete("/ns/key1").unwrap());
        assert!(!store.delete("/ns/key1").unwrap());
    }

    #[test]
    fn test_ttl_expiration() {
        let store = RemoteEntryStore::new(None);
        store
            .write("/ns/short", b"v", Some(Duration::from_millis(50)))
            .unwrap();

        assert!(store.exists("/ns/short").unwrap());
        sleep(Duration::from_millis(80));

        assert!(!store.exists("/ns/short").unwrap());
        assert_eq!(store.read("/ns/short").unwrap(), None);
    }

    #[test]
    fn test_default_ttl_applies_to_zero_ttl() {
        let store = RemoteEntryStore::new(Some(Duration::from_millis(50)));
        store.write("/ns/k", b"v", Some(Duration::ZERO)).unwrap();

        sleep(Duration::from_millis(80));
        assert!(!store.exists("/ns/k").unwrap());
    }

    #[test]
    fn test_delete_prefix() {
        let store = RemoteEntryStore::new(None);
        store.write("/ns/v1/dogs", b"a", None).unwrap();
        store.write("/ns/v1/dogs/page=2", b"b", None).unwrap();
        store.write("/ns/v1/cats", b"c", None).unwrap();

        assert_eq!(store.delete_prefix("/ns/v1/dogs").unwrap(), 2);
        assert!(store.exists("/ns/v1/cats").unwrap());
    }

    #[test]
    fn test_delete_prefix_unsupported() {
        let store = RemoteEntryStore::without_prefix_delete(None);
        store.write("/ns/v1/dogs", b"a", None).unwrap();

        let result = store.delete_prefix("/ns/v1");
        assert!(matches!(result, Err(SmashError::UnsupportedCapability(_))));
        assert!(store.exists("/ns/v1/dogs").unwrap());
    }

    #[test]
    fn test_clear_namespace_is_scoped() {
        let store = RemoteEntryStore::without_prefix_delete(None);
        store.write("/a/one", b"1", None).unwrap();
        store.write("/ab/two", b"2", None).unwrap();

        assert_eq!(store.clear_namespace("a").unwrap(), 1);
        assert!(store.exists("/ab/two").unwrap());
    }

    #[test]
    fn test_purge_expired() {
        let store = RemoteEntryStore::new(None);
        store
            .write("/ns/short", b"v", Some(Duration::from_millis(30)))
            .unwrap();
        store.write("/ns/long", b"v", Some(Duration::from_secs(60))).unwrap();

        sleep(Duration::from_millis(60));

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.len(), 1);
    }
}
