use thiserror::Error;
use unifetch_engine::{ReaderError, StreamToFileError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Reader(#[from] ReaderError),

    #[error("Failed to fetch {input}: {source}")]
    Fetch {
        input: String,
        #[source]
        source: StreamToFileError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}
