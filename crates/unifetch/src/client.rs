use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::{debug, info};

use crate::{ReaderConfig, ReaderError, proxy::build_proxy_from_config};

/// The pair of HTTP clients shared by every HTTP source of a factory.
///
/// `probe` carries the overall probe deadline, `transfer` only bounds
/// connection setup so large bodies can stream for as long as they need.
#[derive(Debug, Clone)]
pub struct HttpClients {
    pub probe: Client,
    pub transfer: Client,
}

fn tls_config() -> Result<ClientConfig, ReaderError> {
    let provider = Arc::new(ring::default_provider());

    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ReaderError::Tls(e.to_string()))?
        .with_platform_verifier()
        .map_err(|e| ReaderError::Tls(e.to_string()))?
        .with_no_client_auth())
}

fn base_builder(config: &ReaderConfig, tls: ClientConfig) -> Result<ClientBuilder, ReaderError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .use_preconfigured_tls(tls);

    if let Some(proxy_config) = &config.proxy {
        let proxy = build_proxy_from_config(proxy_config)
            .map_err(|e| ReaderError::UrlError(format!("proxy: {e}")))?;
        client_builder = client_builder.proxy(proxy);
        debug!(proxy_url = %proxy_config.url, "Using explicitly configured proxy");
    } else if !config.use_system_proxy {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled");
    }

    Ok(client_builder)
}

/// Create the probe and transfer clients for the provided configuration
pub fn create_clients(config: &ReaderConfig) -> Result<HttpClients, ReaderError> {
    let tls = tls_config()?;

    let probe = base_builder(config, tls.clone())?
        .timeout(config.probe_timeout)
        .build()?;

    let mut transfer = base_builder(config, tls)?
        .timeout(None::<Duration>)
        .pool_max_idle_per_host(5);

    if !config.connect_timeout.is_zero() {
        transfer = transfer.connect_timeout(config.connect_timeout);
    }
    if !config.pool_idle_timeout.is_zero() {
        transfer = transfer.pool_idle_timeout(config.pool_idle_timeout);
    }

    let transfer = transfer.build()?;

    info!(
        probe_timeout = ?config.probe_timeout,
        connect_timeout = ?config.connect_timeout,
        system_proxy = config.use_system_proxy && config.proxy.is_none(),
        "HTTP clients ready"
    );

    Ok(HttpClients { probe, transfer })
}
