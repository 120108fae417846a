//! # Cache Types
//!
//! Common types shared by the cache index and the cache manager.

use std::fs::File;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Name of the index file inside the cache root
pub const INDEX_FILE_NAME: &str = "index.json";

/// Suffix marking a file as non-final (staged download or index rewrite)
pub const PART_FILE_SUFFIX: &str = ".part";

/// Metadata for one cached artifact, keyed by its source URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source URL (identity key)
    pub url: String,
    /// Location of the cached file on disk
    pub path: PathBuf,
    /// Display filename of the artifact
    pub filename: String,
    /// Entity tag returned by the server, empty when absent
    #[serde(default)]
    pub etag: String,
    /// Last-Modified token returned by the server, empty when absent
    #[serde(default)]
    pub last_modified: String,
    /// Size of the cached file in bytes
    pub size: u64,
    /// Whether the artifact was fully written and promoted
    pub completed: bool,
    /// When the entry was last committed (unix seconds)
    #[serde(alias = "updated_at_unix")]
    pub updated_at: u64,
}

impl CacheEntry {
    /// Whether the entry carries any token usable for revalidation
    pub fn has_validators(&self) -> bool {
        !self.etag.is_empty() || !self.last_modified.is_empty()
    }
}

/// A temporary file receiving download bytes before it is committed
#[derive(Debug)]
pub struct StagedDownload {
    /// Path of the staging file inside the cache root
    pub path: PathBuf,
    /// Writable handle to the staging file
    pub file: File,
}

/// Configuration for the disk cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Root directory holding cached files and the index
    pub disk_cache_path: PathBuf,
}

impl CacheConfig {
    pub fn new(disk_cache_path: impl Into<PathBuf>) -> Self {
        Self {
            disk_cache_path: disk_cache_path.into(),
        }
    }

    /// Location of the index file
    pub fn index_path(&self) -> PathBuf {
        self.disk_cache_path.join(INDEX_FILE_NAME)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(".cache")
    }
}

/// Result of a cache operation
pub type CacheResult<T> = std::result::Result<T, std::io::Error>;

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
