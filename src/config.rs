//! Configuration Module
//!
//! Handles loading the smash cache configuration from environment variables
//! and applying partial updates to a running facade.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default namespace when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";
/// Default time-to-live for entries (1 hour).
pub const DEFAULT_TTL_SECS: u64 = 3600;
/// Longest time-to-live the facade hands to a backend (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;
/// Number of find calls between counter flushes.
pub const DEFAULT_ACTION_COUNT: u64 = 250;
/// File store object ceiling.
pub const DEFAULT_MAX_OBJECTS: usize = 5000;

/// Which store the facade sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Shared remote entry store
    Remote,
    /// Filesystem directory tree
    File,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(BackendKind::Remote),
            "file" => Ok(BackendKind::File),
            other => Err(format!("unknown backend kind '{}'", other)),
        }
    }
}

/// Smash cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Process-wide switch; when false every facade is a no-op
    pub enabled: bool,
    /// Scoping prefix for every key written by the facade
    pub namespace: String,
    /// TTL applied when a write does not pass one
    pub default_ttl: Duration,
    /// Whether `smash` sweeps every variant of a key by default
    pub wide_net_flush: bool,
    /// Find calls between counter flushes
    pub action_default_count: u64,
    /// Key the hit counter is persisted under (blank disables)
    pub hit_key: String,
    /// Key the miss counter is persisted under (blank disables)
    pub miss_key: String,
    /// Key the object counter is persisted under (blank disables)
    pub object_count_key: String,
    /// Backing store variant
    pub backend: BackendKind,
    /// Whether the remote store can delete by prefix
    pub remote_prefix_delete: bool,
    /// File store object ceiling
    pub max_num_objects: usize,
    /// Root directory of the file store
    pub cache_path: PathBuf,
    /// Root directory of the file store expire logs
    pub expire_log_path: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Expired entry purge interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SMASH_CACHE_ENABLED` - Global switch (default: false)
    /// - `SMASH_CACHE_NAMESPACE` - Namespace (default: "default")
    /// - `SMASH_CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `SMASH_CACHE_WIDE_NET_FLUSH` - Wide-net flush default (default: true)
    /// - `SMASH_CACHE_ACTION_COUNT` - Finds between counter flushes (default: 250)
    /// - `SMASH_CACHE_HIT_KEY` / `SMASH_CACHE_MISS_KEY` / `SMASH_CACHE_OBJECT_COUNT_KEY`
    /// - `SMASH_CACHE_BACKEND` - `remote` or `file` (default: remote)
    /// - `SMASH_CACHE_REMOTE_PREFIX_DELETE` - Remote prefix delete support (default: true)
    /// - `SMASH_CACHE_MAX_OBJECTS` - File store ceiling (default: 5000)
    /// - `SMASH_CACHE_PATH` / `SMASH_CACHE_EXPIRE_LOG_PATH` - File store roots
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_path = env::var("SMASH_CACHE_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_path);
        let expire_log_path = env::var("SMASH_CACHE_EXPIRE_LOG_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_path.join("expire_logs"));

        Self {
            enabled: parse_var("SMASH_CACHE_ENABLED").unwrap_or(defaults.enabled),
            namespace: string_var("SMASH_CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            default_ttl: parse_var::<u64>("SMASH_CACHE_DEFAULT_TTL")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            wide_net_flush: parse_var("SMASH_CACHE_WIDE_NET_FLUSH")
                .unwrap_or(defaults.wide_net_flush),
            action_default_count: parse_var::<u64>("SMASH_CACHE_ACTION_COUNT")
                .filter(|count| *count > 0)
                .unwrap_or(defaults.action_default_count),
            hit_key: string_var("SMASH_CACHE_HIT_KEY").unwrap_or(defaults.hit_key),
            miss_key: string_var("SMASH_CACHE_MISS_KEY").unwrap_or(defaults.miss_key),
            object_count_key: string_var("SMASH_CACHE_OBJECT_COUNT_KEY")
                .unwrap_or(defaults.object_count_key),
            backend: parse_var("SMASH_CACHE_BACKEND").unwrap_or(defaults.backend),
            remote_prefix_delete: parse_var("SMASH_CACHE_REMOTE_PREFIX_DELETE")
                .unwrap_or(defaults.remote_prefix_delete),
            max_num_objects: parse_var("SMASH_CACHE_MAX_OBJECTS")
                .unwrap_or(defaults.max_num_objects),
            cache_path,
            expire_log_path,
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var::<u64>("CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Applies the present, non-blank fields of `update`.
    ///
    /// Returns true when a backend-affecting field changed.
    pub fn apply(&mut self, update: &ConfigUpdate) -> bool {
        let before = (
            self.backend,
            self.remote_prefix_delete,
            self.max_num_objects,
            self.cache_path.clone(),
            self.expire_log_path.clone(),
        );

        if let Some(namespace) = non_blank(&update.namespace) {
            self.namespace = namespace;
        }
        if let Some(ttl) = update.default_ttl.filter(|ttl| !ttl.is_zero()) {
            self.default_ttl = ttl;
        }
        if let Some(wide_net_flush) = update.wide_net_flush {
            self.wide_net_flush = wide_net_flush;
        }
        if let Some(count) = update.action_default_count.filter(|count| *count > 0) {
            self.action_default_count = count;
        }
        if let Some(key) = non_blank(&update.hit_key) {
            self.hit_key = key;
        }
        if let Some(key) = non_blank(&update.miss_key) {
            self.miss_key = key;
        }
        if let Some(key) = non_blank(&update.object_count_key) {
            self.object_count_key = key;
        }
        if let Some(backend) = update.backend {
            self.backend = backend;
        }
        if let Some(prefix_delete) = update.remote_prefix_delete {
            self.remote_prefix_delete = prefix_delete;
        }
        if let Some(max) = update.max_num_objects {
            self.max_num_objects = max;
        }
        if let Some(path) = update.cache_path.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            self.cache_path = path.clone();
        }
        if let Some(path) = update
            .expire_log_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            self.expire_log_path = path.clone();
        }

        before
            != (
                self.backend,
                self.remote_prefix_delete,
                self.max_num_objects,
                self.cache_path.clone(),
                self.expire_log_path.clone(),
            )
    }
}

impl Default for Config {
    fn default() -> Self {
        let cache_path = PathBuf::from("smash_cache");
        Self {
            enabled: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            wide_net_flush: true,
            action_default_count: DEFAULT_ACTION_COUNT,
            hit_key: "/hits".to_string(),
            miss_key: "/misses".to_string(),
            object_count_key: "/object_count".to_string(),
            backend: BackendKind::Remote,
            remote_prefix_delete: true,
            max_num_objects: DEFAULT_MAX_OBJECTS,
            expire_log_path: cache_path.join("expire_logs"),
            cache_path,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

/// Partial reconfiguration; `None` and blank strings leave a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub namespace: Option<String>,
    pub default_ttl: Option<Duration>,
    pub wide_net_flush: Option<bool>,
    pub action_default_count: Option<u64>,
    pub hit_key: Option<String>,
    pub miss_key: Option<String>,
    pub object_count_key: Option<String>,
    pub backend: Option<BackendKind>,
    pub remote_prefix_delete: Option<bool>,
    pub max_num_objects: Option<usize>,
    pub cache_path: Option<PathBuf>,
    pub expire_log_path: Option<PathBuf>,
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn string_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.enabled);
        assert_eq!(config.namespace, "default");
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert!(config.wide_net_flush);
        assert_eq!(config.action_default_count, 250);
        assert_eq!(config.max_num_objects, 5000);
        assert_eq!(config.backend, BackendKind::Remote);
        assert_eq!(config.expire_log_path, PathBuf::from("smash_cache/expire_logs"));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SMASH_CACHE_ENABLED");
        env::remove_var("SMASH_CACHE_NAMESPACE");
        env::remove_var("SMASH_CACHE_ACTION_COUNT");
        env::remove_var("SMASH_CACHE_BACKEND");

        let config = Config::from_env();
        assert!(!config.enabled);
        assert_eq!(config.namespace, "default");
        assert_eq!(config.action_default_count, 250);
        assert_eq!(config.backend, BackendKind::Remote);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("file".parse::<BackendKind>(), Ok(BackendKind::File));
        assert_eq!(" Remote ".parse::<BackendKind>(), Ok(BackendKind::Remote));
        assert!("memcache".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_apply_skips_blank_fields() {
        let mut config = Config::default();
        let update = ConfigUpdate {
            namespace: Some("   ".to_string()),
            hit_key: Some("/api/hits".to_string()),
            action_default_count: Some(0),
            default_ttl: Some(Duration::ZERO),
            ..Default::default()
        };

        let backend_changed = config.apply(&update);

        assert!(!backend_changed);
        assert_eq!(config.namespace, "default");
        assert_eq!(config.hit_key, "/api/hits");
        assert_eq!(config.action_default_count, 250);
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_apply_reports_backend_change() {
        let mut config = Config::default();
        let update = ConfigUpdate {
            backend: Some(BackendKind::File),
            ..Default::default()
        };
        assert!(config.apply(&update));
        assert_eq!(config.backend, BackendKind::File);
    }
}
