use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheManager;
use crate::client::{HttpClients, create_clients};
use crate::source::{FileSource, HttpSource};
use crate::{Reader, ReaderConfig, ReaderError};

/// URI schemes a [`Reader`] can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    File,
    Http,
    Https,
}

impl Scheme {
    fn prefix(self) -> &'static str {
        match self {
            Scheme::File => "file://",
            Scheme::Http => "http://",
            Scheme::Https => "https://",
        }
    }

    /// Strip this scheme's prefix from `uri`
    pub(crate) fn strip<'a>(self, uri: &'a str) -> &'a str {
        uri.get(self.prefix().len()..).unwrap_or_default()
    }
}

/// Opens readers that share one configuration, one pair of HTTP clients
/// and one disk cache
#[derive(Debug)]
pub struct ReaderFactory {
    config: ReaderConfig,
    clients: HttpClients,
    cache: Option<Arc<CacheManager>>,
}

impl ReaderFactory {
    /// Create a factory with default settings
    pub fn new() -> Result<Self, ReaderError> {
        Self::with_config(ReaderConfig::default())
    }

    /// Create a factory with a custom configuration. Opens the disk cache
    /// when caching is enabled.
    pub fn with_config(config: ReaderConfig) -> Result<Self, ReaderError> {
        let clients = create_clients(&config)?;
        let cache = match &config.cache_config {
            Some(cache_config) => Some(Arc::new(CacheManager::new(cache_config)?)),
            None => None,
        };

        Ok(Self {
            config,
            clients,
            cache,
        })
    }

    /// Classify `uri` by its (case-insensitive) scheme prefix
    pub fn detect_scheme(uri: &str) -> Result<Scheme, ReaderError> {
        [Scheme::File, Scheme::Http, Scheme::Https]
            .into_iter()
            .find(|scheme| {
                let prefix = scheme.prefix();
                uri.get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            })
            .ok_or_else(|| ReaderError::UnsupportedScheme(uri.to_string()))
    }

    /// Open a reader over `uri`
    pub fn open(&self, uri: &str) -> Result<Reader, ReaderError> {
        let scheme = Self::detect_scheme(uri)?;
        debug!(uri = %uri, scheme = ?scheme, "Opening reader");

        match scheme {
            Scheme::File => Ok(Reader::from_source(FileSource::open(scheme.strip(uri))?)),
            Scheme::Http | Scheme::Https => Ok(Reader::from_source(HttpSource::probe(
                uri,
                &self.clients,
                self.cache.clone(),
            )?)),
        }
    }

    /// The shared disk cache, if caching is enabled
    pub fn cache_manager(&self) -> Option<&Arc<CacheManager>> {
        self.cache.as_ref()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{start_fixture_server, test_config};
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_detect_scheme() {
        assert_eq!(
            ReaderFactory::detect_scheme("file:///tmp/a.txt").unwrap(),
            Scheme::File
        );
        assert_eq!(
            ReaderFactory::detect_scheme("http://example.com").unwrap(),
            Scheme::Http
        );
        assert_eq!(
            ReaderFactory::detect_scheme("HTTPS://example.com").unwrap(),
            Scheme::Https
        );
        assert!(matches!(
            ReaderFactory::detect_scheme("ftp://test.txt"),
            Err(ReaderError::UnsupportedScheme(uri)) if uri == "ftp://test.txt"
        ));
        assert!(ReaderFactory::detect_scheme("/plain/path").is_err());
        assert!(ReaderFactory::detect_scheme("").is_err());
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(Scheme::File.strip("file:///tmp/a.txt"), "/tmp/a.txt");
        assert_eq!(Scheme::File.strip("FILE://rel.txt"), "rel.txt");
    }

    #[test]
    fn test_factory_shares_cache_between_readers() {
        let server = start_fixture_server();
        let cache_dir = tempdir().unwrap();
        let factory = ReaderFactory::with_config(test_config(Some(cache_dir.path()))).unwrap();
        let url = server.url("/files/report.txt");

        let mut first = factory.open(&url).unwrap();
        let mut bytes = Vec::new();
        first.read_to_end(&mut bytes).unwrap();
        first.close().unwrap();

        let mut second = factory.open(&url).unwrap();
        let mut again = Vec::new();
        second.read_to_end(&mut again).unwrap();

        assert!(second.served_from_cache());
        assert_eq!(again, bytes);
        assert_eq!(factory.cache_manager().unwrap().entries().len(), 1);
    }

    #[test]
    fn test_factory_opens_local_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.txt");
        fs::write(&path, b"on disk").unwrap();

        let factory = ReaderFactory::with_config(test_config(None)).unwrap();
        assert!(factory.cache_manager().is_none());

        let reader = factory
            .open(&format!("file://{}", path.display()))
            .unwrap();
        assert_eq!(reader.filename(), Some("local.txt"));
        assert_eq!(reader.total_size(), Some(7));
    }
}
