//! # Unified Reader
//!
//! Scheme-agnostic front end over a [`Source`], plus the stream-to-file
//! routine that copies a source into a directory under a collision-free
//! name.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::cache::PART_FILE_SUFFIX;
use crate::factory::{ReaderFactory, Scheme};
use crate::paths::unique_file_path;
use crate::progress::{ProgressReader, format_progress};
use crate::source::{FileSource, Source};
use crate::{ReaderConfig, ReaderError};

/// Failure of [`Reader::stream_to_file`], with whatever was left behind
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct StreamToFileError {
    /// Staging file holding the partial copy, if one was created. It is not
    /// removed.
    pub staging_path: Option<PathBuf>,
    /// Bytes copied before the failure
    pub bytes_written: u64,
    #[source]
    pub source: ReaderError,
}

impl StreamToFileError {
    fn new(staging_path: Option<PathBuf>, bytes_written: u64, source: ReaderError) -> Self {
        Self {
            staging_path,
            bytes_written,
            source,
        }
    }
}

/// Reader over a `file://`, `http://` or `https://` URI.
///
/// `Reader::default()` holds no source: reads report end-of-stream and
/// [`stream_to_file`](Self::stream_to_file) fails with
/// [`ReaderError::NilSource`].
#[derive(Default)]
pub struct Reader {
    source: Option<Box<dyn Source>>,
}

impl Reader {
    /// Open `uri` with the default configuration
    pub fn new(uri: &str) -> Result<Self, ReaderError> {
        Self::with_config(uri, &ReaderConfig::default())
    }

    /// Open `uri` with a custom configuration. Local files are opened
    /// without building HTTP clients or touching the cache.
    pub fn with_config(uri: &str, config: &ReaderConfig) -> Result<Self, ReaderError> {
        match ReaderFactory::detect_scheme(uri)? {
            scheme @ Scheme::File => Ok(Self::from_source(FileSource::open(scheme.strip(uri))?)),
            Scheme::Http | Scheme::Https => ReaderFactory::with_config(config.clone())?.open(uri),
        }
    }

    pub fn from_source(source: impl Source + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.filename())
    }

    pub fn total_size(&self) -> Option<u64> {
        self.source.as_ref().and_then(|s| s.total_size())
    }

    /// Whether the content is being served from the disk cache. Only
    /// meaningful once reading has started.
    pub fn served_from_cache(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.served_from_cache())
    }

    pub fn close(&mut self) -> Result<(), ReaderError> {
        match self.source.as_mut() {
            Some(source) => source.close(),
            None => Ok(()),
        }
    }

    /// Copy the whole source into `dest_dir`, logging progress at trace
    /// level. See [`stream_to_file_with_progress`](Self::stream_to_file_with_progress).
    pub fn stream_to_file(
        &mut self,
        dest_dir: impl AsRef<Path>,
    ) -> Result<(PathBuf, u64), StreamToFileError> {
        self.stream_to_file_with_progress(dest_dir, |done, total| {
            trace!(progress = %format_progress(done, total));
        })
    }

    /// Copy the whole source into `dest_dir` under the source's filename,
    /// appending `_1`, `_2`, ... before the extension if that name is
    /// taken. `on_progress` receives the cumulative byte count and the
    /// source's current declared total after every non-empty read.
    ///
    /// Returns the final path and the number of bytes copied.
    pub fn stream_to_file_with_progress<F>(
        &mut self,
        dest_dir: impl AsRef<Path>,
        on_progress: F,
    ) -> Result<(PathBuf, u64), StreamToFileError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let dest_dir = dest_dir.as_ref();
        let Some(source) = self.source.as_mut() else {
            return Err(StreamToFileError::new(None, 0, ReaderError::NilSource));
        };

        let staging_path = dest_dir.join(format!("{}{PART_FILE_SUFFIX}", Uuid::new_v4()));
        let mut staging = File::create_new(&staging_path)
            .map_err(|e| StreamToFileError::new(None, 0, ReaderError::Io(e)))?;
        debug!(path = ?staging_path, "Streaming to staging file");

        // Sources may settle their size on the first read (gzip, cache hits)
        let mut progress =
            ProgressReader::tracking(&mut *source, |s| s.total_size(), on_progress);
        let copied = io::copy(&mut progress, &mut staging);
        let bytes = progress.bytes_read();

        if let Err(e) = copied.and_then(|_| staging.flush()) {
            return Err(StreamToFileError::new(
                Some(staging_path),
                bytes,
                ReaderError::from(e),
            ));
        }
        drop(staging);

        if let Err(e) = source.close() {
            warn!(error = %e, "Failed to close source after copy");
        }

        let final_path = unique_file_path(&dest_dir.join(source.filename()))
            .map_err(|e| StreamToFileError::new(Some(staging_path.clone()), bytes, e.into()))?;

        fs::rename(&staging_path, &final_path)
            .map_err(|e| StreamToFileError::new(Some(staging_path.clone()), bytes, e.into()))?;

        info!(path = ?final_path, bytes, "Saved");
        Ok((final_path, bytes))
    }
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.source.as_mut() {
            Some(source) => source.read(buf),
            None => Ok(0),
        }
    }
}
