//! Local File Store Module
//!
//! Filesystem-backed entry store. Each entry is one `.sc` file under the
//! cache root, laid out by its full path, so a directory removal is a
//! prefix delete. Writes past the object ceiling are rejected rather than
//! evicting anything already cached.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::records::{
    DataLogRecord, ExpireRecord, InfoLogRecord, EXPIRE_BUCKET_FORMAT, INFO_LOG_DAY_FORMAT,
};
use crate::cache::{Backend, CounterKeys, CounterSnapshot};
use crate::error::{Result, SmashError};

/// Extension of entry files.
pub const ENTRY_EXTENSION: &str = "sc";
/// Extension of expire log bucket files.
pub const EXPIRE_LOG_EXTENSION: &str = "ex";
/// Extension of daily info log files.
pub const INFO_LOG_EXTENSION: &str = "il";
/// Per-namespace object count log.
pub const DATA_LOG_FILE_NAME: &str = "cache_data.dl";

/// Expire log line resolved before its entry is written.
#[derive(Debug)]
struct PendingExpireLog {
    dir: PathBuf,
    file_name: String,
    line: String,
}

// == Local File Store ==
#[derive(Debug)]
pub struct LocalFileStore {
    /// Root directory; namespaces are its first-level subdirectories
    cache_path: PathBuf,
    /// Root directory of the per-namespace expire logs
    expire_log_path: PathBuf,
    /// Maximum number of entry files
    max_objects: usize,
    /// Entry files on disk, counted on first use
    live: Mutex<Option<usize>>,
}

impl LocalFileStore {
    // == Constructor ==
    /// Creates a store rooted at `cache_path`. Nothing touches the disk
    /// until the first operation.
    pub fn new(
        cache_path: impl Into<PathBuf>,
        expire_log_path: impl Into<PathBuf>,
        max_objects: usize,
    ) -> Self {
        Self {
            cache_path: cache_path.into(),
            expire_log_path: expire_log_path.into(),
            max_objects,
            live: Mutex::new(None),
        }
    }

    /// Number of entry files currently on disk.
    pub fn len(&self) -> Result<usize> {
        let mut live = self.live.lock();
        self.live_count(&mut live)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Paths ==
    /// Maps a backend key like `/ns/v1/dogs` to `<root>/ns/v1/dogs.sc`.
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let relative = checked_relative(key)?;
        Ok(self
            .cache_path
            .join(format!("{}.{}", relative, ENTRY_EXTENSION)))
    }

    fn namespace_dir(&self, namespace: &str) -> Result<PathBuf> {
        Ok(self.cache_path.join(checked_namespace(namespace)?))
    }

    /// Inverse of `entry_path` for files found while walking.
    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.cache_path).ok()?;
        let relative = relative.to_str()?.replace('\\', "/");
        let stem = relative.strip_suffix(&format!(".{}", ENTRY_EXTENSION))?;
        Some(format!("/{}", stem))
    }

    fn live_count(&self, live: &mut Option<usize>) -> Result<usize> {
        match *live {
            Some(count) => Ok(count),
            None => {
                let count = count_entries(&self.cache_path)?;
                *live = Some(count);
                Ok(count)
            }
        }
    }

    // == Logs ==
    /// Builds the expire log line for `key` without touching the disk.
    fn expire_log_for(&self, key: &str, ttl: Duration) -> Result<PendingExpireLog> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Local::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                SmashError::InvalidRequest(format!("ttl of {}s is out of range", ttl.as_secs()))
            })?;
        let record = ExpireRecord::new(expires_at, key);
        let namespace = key
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();

        Ok(PendingExpireLog {
            dir: self.expire_log_path.join(checked_namespace(namespace)?),
            file_name: format!("{}.{}", record.bucket(), EXPIRE_LOG_EXTENSION),
            line: record.to_line(),
        })
    }

    fn expire_log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let namespaces = match fs::read_dir(&self.expire_log_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };
        for namespace in namespaces {
            let namespace = namespace?.path();
            if !namespace.is_dir() {
                continue;
            }
            for bucket in fs::read_dir(&namespace)? {
                let bucket = bucket?.path();
                if bucket.extension().and_then(|e| e.to_str()) == Some(EXPIRE_LOG_EXTENSION) {
                    files.push(bucket);
                }
            }
        }
        Ok(files)
    }

    fn remove_entry_file(&self, path: &Path, live: &mut Option<usize>) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                if let Some(count) = live.as_mut() {
                    *count = count.saturating_sub(1);
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes matching entry files below `dir`, pruning directories left empty.
    fn remove_matching(
        &self,
        dir: &Path,
        prefix: &str,
        live: &mut Option<usize>,
    ) -> Result<usize> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                removed += self.remove_matching(&path, prefix, live)?;
                // Only succeeds when nothing else lives there.
                let _ = fs::remove_dir(&path);
            } else if self
                .key_for(&path)
                .map(|key| key.starts_with(prefix))
                .unwrap_or(false)
                && self.remove_entry_file(&path, live)?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl Backend for LocalFileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn supports_prefix_delete(&self) -> bool {
        true
    }

    fn supports_tags(&self) -> bool {
        false
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entry_path(key)?.is_file())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let path = self.entry_path(key)?;
        let mut live = self.live.lock();
        let count = self.live_count(&mut live)?;
        let is_new = !path.is_file();

        if is_new && count >= self.max_objects {
            warn!(
                "Cache full - cannot add more - cache: {} - object max reached: {}",
                self.cache_path.display(),
                count
            );
            return Err(SmashError::CapacityExceeded(format!(
                "{} entries at ceiling {}",
                count, self.max_objects
            )));
        }

        // Resolve the expire log first so a bad TTL leaves nothing behind.
        let expire_log = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| self.expire_log_for(key, ttl))
            .transpose()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, value)?;
        if is_new {
            *live = Some(count + 1);
        }
        drop(live);

        match expire_log {
            Some(log) => append_line(&log.dir, &log.file_name, &log.line),
            None => Ok(()),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key)?;
        let mut live = self.live.lock();
        self.remove_entry_file(&path, &mut live)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let relative = checked_relative(prefix)?;
        let target = self.cache_path.join(&relative);
        // Walk the deepest directory that can hold matches.
        let root = if prefix.ends_with('/') || relative.is_empty() {
            target
        } else {
            target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.cache_path.clone())
        };

        let mut live = self.live.lock();
        self.remove_matching(&root, prefix, &mut live)
    }

    fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        if namespace.trim().is_empty() {
            return Ok(0);
        }
        let dir = self.namespace_dir(namespace)?;
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut live = self.live.lock();
        let removed = count_entries(&dir)?;
        fs::remove_dir_all(&dir)?;
        if let Some(count) = live.as_mut() {
            *count = count.saturating_sub(removed);
        }
        Ok(removed)
    }

    fn persist_counters(
        &self,
        namespace: &str,
        keys: &CounterKeys,
        snapshot: &CounterSnapshot,
    ) -> Result<()> {
        let now = Local::now();
        let dir = self.namespace_dir(namespace)?;

        let info = InfoLogRecord::new(&keys.hit_key, &keys.miss_key, snapshot, now);
        if !info.counts.values.is_empty() {
            let file = format!("{}.{}", now.format(INFO_LOG_DAY_FORMAT), INFO_LOG_EXTENSION);
            append_line(&dir, &file, &info.to_line()?)?;
        }

        let data = DataLogRecord::new(snapshot.objects, now);
        append_line(&dir, DATA_LOG_FILE_NAME, &data.to_line()?)
    }

    fn load_object_count(&self, namespace: &str) -> Result<Option<u64>> {
        let path = self.namespace_dir(namespace)?.join(DATA_LOG_FILE_NAME);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match contents.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(line) => Ok(Some(DataLogRecord::parse(line)?.object_data.count)),
            None => Ok(None),
        }
    }

    fn purge_expired(&self) -> Result<usize> {
        let now = Local::now().naive_local();
        let current_bucket = now.format(EXPIRE_BUCKET_FORMAT).to_string();
        let files = self.expire_log_files()?;

        // Latest expiry wins: an overwrite with a longer TTL keeps the entry.
        let mut latest: HashMap<String, NaiveDateTime> = HashMap::new();
        for file in &files {
            for line in fs::read_to_string(file)?.lines() {
                match ExpireRecord::parse(line) {
                    Some(record) => {
                        let slot = latest.entry(record.path).or_insert(record.expires_at);
                        if record.expires_at > *slot {
                            *slot = record.expires_at;
                        }
                    }
                    None => debug!("Skipping unreadable expire log line: {}", line),
                }
            }
        }

        let mut removed = 0;
        {
            let mut live = self.live.lock();
            for (key, expires_at) in latest {
                if expires_at + chrono::Duration::minutes(1) > now {
                    continue;
                }
                let Ok(path) = self.entry_path(&key) else {
                    continue;
                };
                if self.remove_entry_file(&path, &mut live)? {
                    removed += 1;
                }
            }
        }

        for file in files {
            let stale = file
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|stem| stem < current_bucket.as_str())
                .unwrap_or(false);
            if stale {
                fs::remove_file(&file)?;
            }
        }
        Ok(removed)
    }
}

// == Helpers ==
/// Strips the leading `/` and refuses keys that would climb out of the root.
fn checked_relative(key: &str) -> Result<String> {
    let relative = key.trim_start_matches('/');
    let escapes = Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(SmashError::InvalidRequest(format!(
            "key '{}' escapes the cache root",
            key
        )));
    }
    Ok(relative.to_string())
}

/// A namespace is exactly one plain directory name below the root.
fn checked_namespace(namespace: &str) -> Result<&str> {
    let trimmed = namespace.trim_matches('/');
    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !trimmed.contains('/') => Ok(trimmed),
        _ => Err(SmashError::InvalidRequest(format!(
            "namespace '{}' is not a single directory name",
            namespace
        ))),
    }
}

/// Keys ending in `/` are stored as a bare `.sc` file, which has no
/// extension as far as `Path` is concerned.
fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.ends_with(&format!(".{}", ENTRY_EXTENSION)))
}

fn count_entries(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut count = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            count += count_entries(&path)?;
        } else if is_entry_file(&path) {
            count += 1;
        }
    }
    Ok(count)
}

fn append_line(dir: &Path, file_name: &str, line: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(file_name))?;
    writeln!(file, "{}", line)?;
    Ok(())
}
