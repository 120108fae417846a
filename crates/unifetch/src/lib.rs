//! # unifetch-engine
//!
//! Uniform blocking reader over local files and HTTP(S) resources.
//!
//! HTTP content is persisted to a disk cache while it is being read and
//! revalidated with `If-None-Match` / `If-Modified-Since` on later requests,
//! so unchanged resources are served from disk after a single `304` round
//! trip. Gzip payloads (by content type) are decompressed on the fly.
//!
//! ```no_run
//! use unifetch_engine::{Reader, ReaderConfig};
//!
//! let config = ReaderConfig::builder().with_cache_dir(".cache").build();
//! let mut reader = Reader::with_config("https://example.com/data.csv", &config)?;
//! let (path, bytes) = reader.stream_to_file("downloads")?;
//! println!("saved {bytes} bytes to {}", path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod paths;
pub mod progress;
pub mod proxy;
pub mod reader;
pub mod source;
pub mod tee;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use builder::ReaderConfigBuilder;
pub use cache::{CacheConfig, CacheEntry, CacheManager};
pub use config::ReaderConfig;
pub use error::ReaderError;
pub use factory::{ReaderFactory, Scheme};
pub use paths::unique_file_path;
pub use progress::{ProgressReader, format_progress, humanize_size, notify_progress};
pub use reader::{Reader, StreamToFileError};
pub use source::{FileSource, HttpSource, Source};
pub use tee::{TeeReader, TeeSummary};
