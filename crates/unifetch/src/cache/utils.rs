//! # Cache Utilities
//!
//! Common utility functions for cache operations.

use reqwest::blocking::Response;
use reqwest::header::{CONTENT_TYPE, ETAG, HeaderName, LAST_MODIFIED};

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the cache-related headers (etag, last-modified, content-type)
/// from an HTTP response
pub fn extract_cache_headers(
    response: &Response,
) -> (Option<String>, Option<String>, Option<String>) {
    (
        header_string(response, ETAG),
        header_string(response, LAST_MODIFIED),
        header_string(response, CONTENT_TYPE),
    )
}
