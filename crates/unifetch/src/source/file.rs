use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::Source;
use crate::ReaderError;

enum FileState {
    Pending,
    Open(File),
    Closed,
}

/// Pass-through reader over a local file
pub struct FileSource {
    path: PathBuf,
    filename: String,
    size: u64,
    state: FileState,
}

impl FileSource {
    /// Check that `path` names an existing regular file and capture its
    /// name and size. The file itself is opened on first read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref().to_path_buf();
        let metadata = match path.metadata() {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(ReaderError::FileNotFound(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ReaderError::FileNotFound(path));
            }
            Err(e) => return Err(ReaderError::Io(e)),
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(path = ?path, size = metadata.len(), "Opened file source");
        Ok(Self {
            path,
            filename,
            size: metadata.len(),
            state: FileState::Pending,
        })
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let FileState::Pending = self.state {
            let file = File::open(&self.path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ReaderError::FileNotFound(self.path.clone()).into(),
                _ => e,
            })?;
            self.state = FileState::Open(file);
        }

        match &mut self.state {
            FileState::Open(file) => file.read(buf),
            _ => Ok(0),
        }
    }
}

impl Source for FileSource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn total_size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn close(&mut self) -> Result<(), ReaderError> {
        self.state = FileState::Closed;
        Ok(())
    }
}
