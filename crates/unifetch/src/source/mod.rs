//! # Sources
//!
//! Byte sources the [`Reader`](crate::Reader) dispatches to: local files
//! and HTTP(S) resources.

use std::io::Read;

use crate::ReaderError;

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

/// Capability interface shared by every backend
pub trait Source: Read + Send {
    /// Name the content should be saved under
    fn filename(&self) -> &str;

    /// Declared size in bytes, if known
    fn total_size(&self) -> Option<u64>;

    /// Release the underlying resources. Reads after close report EOF.
    fn close(&mut self) -> Result<(), ReaderError>;

    /// Whether the bytes are being served from the local cache
    fn served_from_cache(&self) -> bool {
        false
    }
}
