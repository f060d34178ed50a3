//! Cache Facade Module
//!
//! Public surface of the smash cache. Every operation is a failure
//! boundary: backend errors are logged with the operation, key and
//! namespace, then turned into the operation's empty result.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::cache::{
    key, tags, Backend, CounterAggregator, CounterKeys, CounterSnapshot, LocalFileStore,
    RemoteEntryStore,
};
use crate::config::{BackendKind, Config, ConfigUpdate, MAX_TTL_SECS};
use crate::error::{Result, SmashError};

// == Backend Construction ==
/// Builds the store named by the configuration. Neither store touches the
/// network or disk until first used.
pub fn build_backend(config: &Config) -> Arc<dyn Backend> {
    match config.backend {
        BackendKind::Remote => {
            Arc::new(RemoteEntryStore::new(None).with_prefix_delete(config.remote_prefix_delete))
        }
        BackendKind::File => Arc::new(LocalFileStore::new(
            config.cache_path.clone(),
            config.expire_log_path.clone(),
            config.max_num_objects,
        )),
    }
}

// == Cache Facade ==
/// Caching facade with key, pattern and tag sweeping.
///
/// Counters are plain fields behind `&mut self`; share one facade across
/// threads by wrapping it in a mutex.
#[derive(Debug)]
pub struct CacheFacade {
    config: Config,
    backend: Arc<dyn Backend>,
    counters: CounterAggregator,
}

impl CacheFacade {
    // == Constructors ==
    /// Creates a facade over the backend named in `config`.
    pub fn from_config(config: Config) -> Self {
        let backend = build_backend(&config);
        Self::with_backend(config, backend)
    }

    /// Creates a facade over an existing backend, e.g. a store shared by
    /// several namespaces.
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Self {
        let mut facade = Self {
            counters: CounterAggregator::new(config.action_default_count),
            config,
            backend,
        };
        facade.seed_object_count();
        facade
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the backend, e.g. for the purge task.
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// In-memory counters; persisted copies may lag by up to one flush window.
    pub fn stats(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Lookups since the last counter flush.
    pub fn pending_lookups(&self) -> u64 {
        self.counters.action_count()
    }

    // == Update Defaults ==
    /// Overwrites the non-blank fields of `update`. Changing the backend
    /// kind or its paths switches to a freshly built store.
    pub fn update_defaults(&mut self, update: ConfigUpdate) {
        let previous_namespace = self.config.namespace.clone();
        let backend_changed = self.config.apply(&update);
        self.counters.set_threshold(self.config.action_default_count);

        if backend_changed {
            self.backend = build_backend(&self.config);
        }
        if backend_changed || previous_namespace != self.config.namespace {
            self.counters.set_objects(0);
            self.seed_object_count();
        }
    }

    // == Exists ==
    /// True iff a live entry exists for `key`. Errors read as absent.
    pub fn exists(&self, key: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.try_exists(key)
            .unwrap_or_else(|e| self.report("exists", key, &e, false))
    }

    // == Find ==
    /// Returns the payload for `key`, counting the lookup as a hit or miss.
    /// Errors read as a miss.
    pub fn find(&mut self, key: &str) -> Option<Vec<u8>> {
        if !self.config.enabled {
            return None;
        }
        self.try_find(key)
            .unwrap_or_else(|e| self.report("find", key, &e, None))
    }

    // == Add ==
    /// Writes `data` only if `key` is absent, then records it under `tags`.
    /// Returns whether the write happened.
    pub fn add<S: AsRef<str>>(
        &mut self,
        key: &str,
        data: &[u8],
        ttl: Option<Duration>,
        tags: &[S],
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.try_add(key, data, ttl, tags)
            .unwrap_or_else(|e| self.report("add", key, &e, false))
    }

    // == Replace ==
    /// Writes `data` unconditionally, then records it under `tags`.
    /// Returns whether an entry was overwritten.
    pub fn replace<S: AsRef<str>>(
        &mut self,
        key: &str,
        data: &[u8],
        ttl: Option<Duration>,
        tags: &[S],
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.try_replace(key, data, ttl, tags)
            .unwrap_or_else(|e| self.report("replace", key, &e, false))
    }

    // == Smash ==
    /// Invalidates `key` in the default namespace. `None` uses the
    /// configured wide-net default.
    pub fn smash(&mut self, key: &str, wide_net_flush: Option<bool>) {
        let namespace = self.config.namespace.clone();
        self.smash_in(&namespace, key, wide_net_flush);
    }

    /// Invalidates `key` in an explicit namespace.
    ///
    /// Wide-net flushes delete every entry under the key's full path when
    /// the backend can delete by prefix, and otherwise sweep the key's tag.
    pub fn smash_in(&mut self, namespace: &str, key: &str, wide_net_flush: Option<bool>) {
        if !self.config.enabled {
            return;
        }
        let wide_net_flush = wide_net_flush.unwrap_or(self.config.wide_net_flush);
        if let Err(e) = self.try_smash(namespace, key, wide_net_flush) {
            self.report_in("smash", namespace, key, &e, ());
        }
    }

    // == Smash By Tag ==
    /// Deletes every key recorded under `tag`, then the tag itself.
    pub fn smash_by_tag(&mut self, tag: &str) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self.try_smash_by_tag(tag) {
            self.report("smash_by_tag", tag, &e, ());
        }
    }

    // == Smash By Pattern ==
    /// Deletes every entry of the default namespace starting with `prefix`.
    pub fn smash_by_pattern(&mut self, prefix: &str) {
        let namespace = self.config.namespace.clone();
        self.smash_by_pattern_in(&namespace, prefix);
    }

    /// Deletes every entry of `namespace` starting with `prefix`. Backends
    /// without prefix deletes log a notification and delete nothing.
    pub fn smash_by_pattern_in(&mut self, namespace: &str, prefix: &str) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self.try_smash_by_pattern(namespace, prefix) {
            self.report_in("smash_by_pattern", namespace, prefix, &e, ());
        }
    }

    // == Smash The Cache ==
    /// Clears a whole namespace (the default one when `None`).
    pub fn smash_the_cache(&mut self, namespace: Option<&str>) {
        if !self.config.enabled {
            return;
        }
        let namespace = namespace
            .filter(|ns| !ns.trim().is_empty())
            .unwrap_or(self.config.namespace.as_str())
            .to_string();

        match self.backend.clear_namespace(&namespace) {
            Ok(removed) => {
                warn!(
                    namespace = %namespace,
                    removed,
                    "SmashCache notification: {} namespace smashed!",
                    namespace
                );
                if namespace == self.config.namespace {
                    self.counters.set_objects(0);
                    self.flush_counters();
                }
            }
            Err(e) => self.report_in("smash_the_cache", &namespace, "", &e, ()),
        }
    }

    // == Internals ==
    fn try_exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(&self.config.namespace, key)?;
        self.backend.exists(&path)
    }

    fn try_find(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(&self.config.namespace, key)?;
        let data = self.backend.read(&path)?;

        if self.counters.record_lookup(data.is_some()) {
            self.flush_counters();
        }
        Ok(data)
    }

    fn try_add<S: AsRef<str>>(
        &mut self,
        key: &str,
        data: &[u8],
        ttl: Option<Duration>,
        tags: &[S],
    ) -> Result<bool> {
        let path = self.resolve(&self.config.namespace, key)?;
        if self.backend.exists(&path)? {
            return Ok(false);
        }

        let ttl = self.effective_ttl(ttl);
        self.backend.write(&path, data, Some(ttl))?;
        self.counters.record_created();
        self.tag(key, &path, ttl, tags);
        Ok(true)
    }

    fn try_replace<S: AsRef<str>>(
        &mut self,
        key: &str,
        data: &[u8],
        ttl: Option<Duration>,
        tags: &[S],
    ) -> Result<bool> {
        let path = self.resolve(&self.config.namespace, key)?;
        let existed = self.backend.exists(&path)?;

        let ttl = self.effective_ttl(ttl);
        self.backend.write(&path, data, Some(ttl))?;
        if !existed {
            self.counters.record_created();
        }
        self.tag(key, &path, ttl, tags);
        Ok(existed)
    }

    fn try_smash(&mut self, namespace: &str, key: &str, wide_net_flush: bool) -> Result<()> {
        let path = self.resolve(namespace, key)?;

        let removed = if wide_net_flush && self.backend.supports_prefix_delete() {
            self.backend.delete_prefix(&path)?
        } else if wide_net_flush && self.backend.supports_tags() {
            // Wide-net flush without prefix deletes assumes the variants were tagged.
            let swept = tags::sweep_tag(&*self.backend, &key::tag_path(&key::shorten(key)))?;
            swept + usize::from(self.backend.delete(&path)?)
        } else {
            usize::from(self.backend.delete(&path)?)
        };

        debug!(namespace, key, removed, "smashed key");
        self.counters.record_removed(removed as u64);
        Ok(())
    }

    fn try_smash_by_tag(&mut self, tag: &str) -> Result<()> {
        if !self.backend.supports_tags() {
            return Err(SmashError::UnsupportedCapability(format!(
                "{} store cannot use tags yet, use smash_by_pattern",
                self.backend.name()
            )));
        }
        let tag = non_blank(tag)?;

        let removed = tags::sweep_tag(&*self.backend, &key::tag_path(&key::shorten(tag)))?;
        debug!(tag, removed, "swept tag");
        self.counters.record_removed(removed as u64);
        Ok(())
    }

    fn try_smash_by_pattern(&mut self, namespace: &str, prefix: &str) -> Result<()> {
        if !self.backend.supports_prefix_delete() {
            return Err(SmashError::UnsupportedCapability(format!(
                "{} store cannot smash by pattern, use smash_by_tag",
                self.backend.name()
            )));
        }
        let prefix = non_blank(prefix)?;

        let pattern = key::pattern_path(namespace, &key::shorten(prefix));
        let removed = self.backend.delete_prefix(&pattern)?;
        debug!(namespace, pattern = %pattern, removed, "smashed pattern");
        self.counters.record_removed(removed as u64);
        Ok(())
    }

    /// Records `path` under each tag. Tag failures never undo the write.
    fn tag<S: AsRef<str>>(&self, key: &str, path: &str, ttl: Duration, tags: &[S]) {
        if tags.is_empty() {
            return;
        }
        if !self.backend.supports_tags() {
            debug!(key, backend = self.backend.name(), "tags skipped, backend has no tag support");
            return;
        }

        let tag_keys: Vec<String> = tags
            .iter()
            .map(|tag| tag.as_ref())
            .filter(|tag| !tag.trim().is_empty())
            .map(|tag| key::tag_path(&key::shorten(tag)))
            .collect();
        if let Err(e) = tags::add_tags(
            &*self.backend,
            &tag_keys,
            path,
            Some(ttl),
            self.config.default_ttl,
        ) {
            self.report("add_tags", key, &e, ());
        }
    }

    fn flush_counters(&self) {
        let keys = CounterKeys {
            hit_key: self.config.hit_key.clone(),
            miss_key: self.config.miss_key.clone(),
            object_count_key: self.config.object_count_key.clone(),
        };
        let snapshot = self.counters.snapshot();
        if let Err(e) = self
            .backend
            .persist_counters(&self.config.namespace, &keys, &snapshot)
        {
            self.report("flush_counters", "", &e, ());
        }
    }

    fn seed_object_count(&mut self) {
        if !self.config.enabled {
            return;
        }
        match self.backend.load_object_count(&self.config.namespace) {
            Ok(Some(count)) => self.counters.set_objects(count),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    namespace = %self.config.namespace,
                    error = %e,
                    "Unreadable object count, starting from zero"
                );
                self.counters.set_objects(0);
            }
        }
    }

    fn resolve(&self, namespace: &str, key: &str) -> Result<String> {
        let key = non_blank(key)?;
        Ok(key::full_path(namespace, &key::shorten(key)))
    }

    /// Zero or missing means the configured default; anything past a year
    /// is clamped to a year.
    fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.config.default_ttl)
            .min(Duration::from_secs(MAX_TTL_SECS))
    }

    fn report<T>(&self, op: &str, key: &str, err: &SmashError, fallback: T) -> T {
        self.report_in(op, &self.config.namespace, key, err, fallback)
    }

    fn report_in<T>(&self, op: &str, namespace: &str, key: &str, err: &SmashError, fallback: T) -> T {
        match err {
            SmashError::CapacityExceeded(_) | SmashError::UnsupportedCapability(_) => {
                warn!(op, key, namespace, error = %err, "SmashCache notification")
            }
            _ => error!(op, key, namespace, error = %err, "SmashCache operation failed"),
        }
        fallback
    }
}

fn non_blank(value: &str) -> Result<&str> {
    if value.is_empty() {
        Err(SmashError::InvalidRequest("key cannot be empty".to_string()))
    } else {
        Ok(value)
    }
}
