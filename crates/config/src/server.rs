//! HTTP server configuration.

use std::net::SocketAddr;

use serde::Deserialize;

/// Settings for the HTTP listener.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind; the binary falls back to `127.0.0.1:8012`.
    pub listen_address: Option<SocketAddr>,
    /// Path for the health endpoint.
    pub health_path: Option<String>,
}

impl ServerConfig {
    /// Health endpoint path with its default applied.
    pub fn health_path(&self) -> &str {
        self.health_path.as_deref().unwrap_or("/health")
    }
}
