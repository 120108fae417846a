//! # Tee Reader
//!
//! A reader that copies every byte handed to its consumer into a second
//! sink. The sink is advisory: write failures disable it but never affect
//! what the consumer reads. Once closed (or dropped) the completion
//! callback runs exactly once with a [`TeeSummary`].

use std::io::{self, Read, Write};

use tracing::warn;

/// Outcome of a teed transfer, handed to the completion callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeeSummary {
    /// Bytes successfully written to the sink
    pub written: u64,
    /// The source reached end-of-stream and every sink write succeeded
    pub complete: bool,
}

/// Completion callback of a [`TeeReader`]
pub type OnTeeClose = Box<dyn FnOnce(TeeSummary) + Send>;

pub struct TeeReader<R, W: Write> {
    source: Option<R>,
    sink: Option<W>,
    written: u64,
    exhausted: bool,
    sink_failed: bool,
    on_close: Option<OnTeeClose>,
}

impl<R, W: Write> TeeReader<R, W> {
    pub fn new(source: R, sink: W, on_close: OnTeeClose) -> Self {
        Self {
            source: Some(source),
            sink: Some(sink),
            written: 0,
            exhausted: false,
            sink_failed: false,
            on_close: Some(on_close),
        }
    }

    /// Bytes written to the sink so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Release the source and the sink, then fire the completion callback.
    /// Calling this more than once is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        drop(self.source.take());

        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.flush() {
                warn!(error = %e, "Failed to flush tee sink");
                self.sink_failed = true;
            }
        }

        if let Some(on_close) = self.on_close.take() {
            on_close(TeeSummary {
                written: self.written,
                complete: self.exhausted && !self.sink_failed,
            });
        }
        Ok(())
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(source) = self.source.as_mut() else {
            return Ok(0);
        };

        let n = source.read(buf)?;
        if n == 0 {
            if !buf.is_empty() {
                self.exhausted = true;
            }
            return Ok(0);
        }

        if !self.sink_failed {
            if let Some(sink) = self.sink.as_mut() {
                match sink.write_all(&buf[..n]) {
                    Ok(()) => self.written += n as u64,
                    Err(e) => {
                        warn!(error = %e, written = self.written, "Tee sink write failed, no longer copying");
                        self.sink_failed = true;
                    }
                }
            }
        }

        Ok(n)
    }
}

impl<R, W: Write> Drop for TeeReader<R, W> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
