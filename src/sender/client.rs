use reqwest::{Client, ClientBuilder, redirect};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Operational constants for the shared webhook client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bounds the whole request, including TLS handshake and response headers.
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_idle_connections: usize,
    pub keep_alive_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            connection_timeout: Duration::from_secs(5),
            max_idle_connections: 100,
            keep_alive_timeout: Duration::from_secs(300),
            tcp_keepalive: Duration::from_secs(300),
            user_agent: format!("rail-log-forwarder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Build the pooled client shared by every delivery.
///
/// Redirects are never followed; the first response is final.
pub fn build_client(config: &ClientConfig) -> Result<Client, ClientError> {
    let client = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connection_timeout)
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(config.keep_alive_timeout)
        .tcp_keepalive(config.tcp_keepalive)
        .redirect(redirect::Policy::none())
        .user_agent(&config.user_agent)
        .build()?;

    Ok(client)
}
