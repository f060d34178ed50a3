//! Expiry Purge Task
//!
//! Background task that periodically asks the backend to drop expired
//! entries. The file store has no native expiry, so this is what turns its
//! expire logs into deletions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::Backend;

/// Spawns a background task that periodically purges expired entries.
///
/// The purge runs on the blocking pool since file stores walk directories.
///
/// # Arguments
/// * `backend` - Store shared with the facade
/// * `interval_secs` - Interval in seconds between purge runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_purge_task(backend: Arc<dyn Backend>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry purge task for {} store with interval of {} seconds",
            backend.name(),
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let store = Arc::clone(&backend);
            match tokio::task::spawn_blocking(move || store.purge_expired()).await {
                Ok(Ok(removed)) if removed > 0 => {
                    info!("Expiry purge: removed {} expired entries", removed)
                }
                Ok(Ok(_)) => debug!("Expiry purge: no expired entries found"),
                Ok(Err(e)) => error!(error = %e, "Expiry purge failed"),
                Err(e) => error!(error = %e, "Expiry purge task panicked"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RemoteEntryStore;

    #[tokio::test]
    async fn test_purge_task_removes_expired_entries() {
        let store = RemoteEntryStore::new(None);
        store
            .write("/ns/expire_soon", b"value", Some(Duration::from_millis(200)))
            .unwrap();

        let handle = spawn_purge_task(Arc::new(store.clone()), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.len(), 0, "Expired entry should have been purged");
        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_preserves_valid_entries() {
        let store = RemoteEntryStore::new(None);
        store
            .write("/ns/long_lived", b"value", Some(Duration::from_secs(3600)))
            .unwrap();

        let handle = spawn_purge_task(Arc::new(store.clone()), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.read("/ns/long_lived").unwrap(), Some(b"value".to_vec()));
        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_can_be_aborted() {
        let handle = spawn_purge_task(Arc::new(RemoteEntryStore::new(None)), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
