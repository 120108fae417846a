mod headers;
pub mod progress;

use unifetch_engine::humanize_size;

// Export utility functions
pub use self::headers::parse_headers;

/// Convert bytes to a human-readable format
pub fn format_bytes(bytes: u64) -> String {
    let (value, unit) = humanize_size(bytes);
    format!("{value:.2} {unit}")
}
