//! # Cache System
//!
//! Disk cache for HTTP content: a persistent index of URL → artifact
//! metadata plus the staging/commit machinery that fills it.

// Module declarations
mod index;
mod manager;
mod types;
mod utils;

pub use manager::CacheManager;
pub use types::{
    CacheConfig, CacheEntry, CacheResult, INDEX_FILE_NAME, PART_FILE_SUFFIX, StagedDownload,
};
pub use utils::extract_cache_headers;
