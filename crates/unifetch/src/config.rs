use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::{cache::CacheConfig, proxy::ProxyConfig};

const DEFAULT_USER_AGENT: &str = concat!("unifetch/", env!("CARGO_PKG_VERSION"));

/// Timeout for the HEAD probe performed when an HTTP source is opened
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection timeout for the transfer client
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long an idle keep-alive connection of the transfer client is kept
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Configurable options for readers
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Disk cache configuration, `None` disables caching of HTTP content
    pub cache_config: Option<CacheConfig>,

    /// Overall timeout for the existence/metadata probe
    pub probe_timeout: Duration,

    /// Time allowed to establish a connection for the real fetch.
    /// Body reads carry no deadline.
    pub connect_timeout: Duration,

    /// Idle keep-alive timeout of the transfer client
    pub pool_idle_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Extra headers sent with every request
    pub headers: HeaderMap,

    /// Proxy configuration (optional)
    pub proxy: Option<ProxyConfig>,

    /// Whether to use system proxy settings if available
    pub use_system_proxy: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            cache_config: Some(CacheConfig::default()),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HeaderMap::new(),
            proxy: None,
            use_system_proxy: true,
        }
    }
}

impl ReaderConfig {
    pub fn builder() -> crate::builder::ReaderConfigBuilder {
        crate::builder::ReaderConfigBuilder::new()
    }

    /// Root directory of the disk cache, if caching is enabled
    pub fn cache_dir(&self) -> Option<&PathBuf> {
        self.cache_config.as_ref().map(|c| &c.disk_cache_path)
    }
}
