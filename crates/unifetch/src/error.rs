use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;

// Error type for reader construction, pipeline establishment and streaming
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("url not exists: {url} (status {status})")]
    UrlNotFound { url: String, status: StatusCode },

    #[error("reader source is nil")]
    NilSource,

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),
}

impl ReaderError {
    /// Whether this error belongs to the not-found class: a missing local
    /// file, a failed existence probe or a non-success status on the fetch.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::UrlNotFound { .. })
    }

    /// Borrow the `ReaderError` carried inside an `io::Error` produced by a
    /// source's `Read` implementation, if there is one.
    pub fn from_io(err: &io::Error) -> Option<&ReaderError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<ReaderError>())
    }

    pub(crate) fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::FileNotFound(_) | Self::UrlNotFound { .. } => io::ErrorKind::NotFound,
            Self::Decode(_) => io::ErrorKind::InvalidData,
            Self::UnsupportedScheme(_) | Self::UrlError(_) => io::ErrorKind::InvalidInput,
            Self::Io(e) => e.kind(),
            Self::NilSource | Self::Http(_) | Self::Tls(_) => io::ErrorKind::Other,
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(err: io::Error) -> Self {
        if !err
            .get_ref()
            .is_some_and(|inner| inner.is::<ReaderError>())
        {
            return ReaderError::Io(err);
        }

        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<ReaderError>()) {
            Some(Ok(inner)) => *inner,
            _ => ReaderError::Io(io::Error::from(kind)),
        }
    }
}

impl From<ReaderError> for io::Error {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Io(e) => e,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_class() {
        assert!(ReaderError::FileNotFound(PathBuf::from("missing.txt")).is_not_found());
        assert!(
            ReaderError::UrlNotFound {
                url: "http://localhost/x".to_string(),
                status: StatusCode::FORBIDDEN,
            }
            .is_not_found()
        );
        assert!(!ReaderError::NilSource.is_not_found());
    }

    #[test]
    fn test_io_round_trip_keeps_variant() {
        let err: io::Error = ReaderError::UrlNotFound {
            url: "http://localhost/x".to_string(),
            status: StatusCode::NOT_FOUND,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(matches!(
            ReaderError::from_io(&err),
            Some(ReaderError::UrlNotFound { .. })
        ));

        let back = ReaderError::from(err);
        assert!(matches!(back, ReaderError::UrlNotFound { status, .. } if status == StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_plain_io_error_is_wrapped() {
        let err = ReaderError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        match err {
            ReaderError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_maps_to_invalid_data() {
        let err: io::Error = ReaderError::Decode("bad gzip".to_string()).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "decode error: bad gzip");
    }

    #[test]
    fn test_messages() {
        assert_eq!(ReaderError::NilSource.to_string(), "reader source is nil");
        assert_eq!(
            ReaderError::UnsupportedScheme("ftp://test.txt".to_string()).to_string(),
            "unsupported scheme: ftp://test.txt"
        );
    }
}
