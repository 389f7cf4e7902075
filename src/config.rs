//! Tidepool configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main Tidepool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TidepoolConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// URL artifact cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Keyword extraction configuration
    #[serde(default)]
    pub keywords: KeywordConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for the object store and index documents
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// URL artifact cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache pointer time-to-live in seconds
    pub url_ttl_secs: u64,

    /// HTTP fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Maximum fetched body size in bytes
    pub max_fetch_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url_ttl_secs: 24 * 60 * 60,
            fetch_timeout_secs: 8,
            max_fetch_bytes: 50 * 1024,
        }
    }
}

/// Keyword extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Only words strictly longer than this become tags
    pub min_length: usize,

    /// Additional stop-words merged into the built-in list
    pub extra_stop_words: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_length: 5,
            extra_stop_words: Vec::new(),
        }
    }
}

impl TidepoolConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Default base directory (~/.tidepool/)
pub fn default_base_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tidepool")
}
