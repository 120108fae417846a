//! # Progress Reporting
//!
//! Byte-counting reader wrapper plus the human-readable formatting used
//! when streaming to disk.

use std::io::{self, Read, Write};

const UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Scale a byte count to the largest unit (1024-based) that keeps the
/// value at or above 1. Tops out at TB.
pub fn humanize_size(bytes: u64) -> (f64, &'static str) {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    (value, UNITS[unit])
}

/// Render a single progress line (without the leading carriage return)
pub fn format_progress(done: u64, total: Option<u64>) -> String {
    let (done_value, done_unit) = humanize_size(done);

    match total {
        Some(total) if total > 0 => {
            let (total_value, total_unit) = humanize_size(total);
            let percent = done as f64 / total as f64 * 100.0;
            format!(
                "Downloaded {done_value:.2} {done_unit} / {total_value:.2} {total_unit} ({percent:.2}%)..."
            )
        }
        _ if done_unit == UNITS[0] => format!("Downloaded {done} bytes..."),
        _ => format!("Downloaded {done_value:.2} {done_unit}..."),
    }
}

/// Write a progress line prefixed with `\r` so it overwrites the previous one
pub fn notify_progress<W: Write>(writer: &mut W, done: u64, total: Option<u64>) -> io::Result<()> {
    write!(writer, "\r{}", format_progress(done, total))?;
    writer.flush()
}

/// Reader wrapper that reports the cumulative byte count after every
/// non-empty read
pub struct ProgressReader<R, F> {
    inner: R,
    total: Option<u64>,
    size_of: Option<fn(&R) -> Option<u64>>,
    bytes_read: u64,
    on_progress: F,
}

impl<R, F> ProgressReader<R, F>
where
    F: FnMut(u64, Option<u64>),
{
    pub fn new(inner: R, total: Option<u64>, on_progress: F) -> Self {
        Self {
            inner,
            total,
            size_of: None,
            bytes_read: 0,
            on_progress,
        }
    }

    /// Like [`new`](Self::new), but the total is asked of the inner reader
    /// after every read, for sources that only learn their size once the
    /// transfer has started.
    pub fn tracking(inner: R, size_of: fn(&R) -> Option<u64>, on_progress: F) -> Self {
        Self {
            total: size_of(&inner),
            size_of: Some(size_of),
            ..Self::new(inner, None, on_progress)
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R, F> Read for ProgressReader<R, F>
where
    R: Read,
    F: FnMut(u64, Option<u64>),
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.bytes_read += n as u64;
            if let Some(size_of) = self.size_of {
                self.total = size_of(&self.inner);
            }
            (self.on_progress)(self.bytes_read, self.total);
        }
        Ok(n)
    }
}
