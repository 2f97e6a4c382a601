//! Configuration for the indexer.
//!
//! Layered settings: built-in defaults, then a `phpdex.toml` file, then
//! environment variable overrides. Environment variables are prefixed with
//! `PHPDEX_` and use double underscores for nesting:
//! `PHPDEX_INDEXING__PARALLEL_THREADS=8` sets `indexing.parallel_threads`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

static GLOBAL_DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_global_debug(enabled: bool) {
    GLOBAL_DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn is_global_debug_enabled() -> bool {
    GLOBAL_DEBUG.load(Ordering::Relaxed)
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the on-disk cache.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode.
    #[serde(default = "default_false")]
    pub debug: bool,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Number of parallel worker threads for indexing.
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Glob-ish path fragments to skip during directory walks.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Whether the document cache is written after indexing.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// File name of the cache inside `index_path`.
    #[serde(default = "default_cache_file")]
    pub file_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            debug: false,
            indexing: IndexingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_name: default_cache_file(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `phpdex.toml`, and the environment.
    pub fn load() -> IndexResult<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("phpdex.toml"))
            .merge(Env::prefixed("PHPDEX_").split("__"))
            .extract()
            .map_err(|e| IndexError::ConfigError {
                reason: e.to_string(),
            })?;
        Ok(settings)
    }

    /// Propagate process-wide toggles derived from these settings.
    pub fn apply(&self) {
        set_global_debug(self.debug);
    }

    /// Full path of the document cache file.
    pub fn cache_path(&self) -> PathBuf {
        self.index_path.join(&self.cache.file_name)
    }
}

fn default_version() -> u32 {
    1
}

fn default_index_path() -> PathBuf {
    PathBuf::from(".phpdex")
}

fn default_false() -> bool {
    false
}

fn default_true() -> bool {
    true
}

fn default_parallel_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_cache_file() -> String {
    "documents.cache".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.cache.enabled);
        assert!(!settings.debug);
        assert!(settings.indexing.parallel_threads >= 1);
        assert!(settings.cache_path().ends_with("documents.cache"));
    }

    #[test]
    fn test_global_debug_toggle() {
        set_global_debug(true);
        assert!(is_global_debug_enabled());
        set_global_debug(false);
        assert!(!is_global_debug_enabled());
    }
}
