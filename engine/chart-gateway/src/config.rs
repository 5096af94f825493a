//! Configuration for the ChartGateway

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main configuration for the ChartGateway
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: crate::DEFAULT_PORT }
    }
}

impl GatewayConfig {
    /// Get the server address
    pub fn server_addr(&self) -> GatewayResult<SocketAddr> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }

    /// Load configuration from file
    pub fn load_from_file(path: &str) -> GatewayResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> GatewayResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override host and port from `GATEWAY_HOST` / `GATEWAY_PORT`
    pub fn apply_env(&mut self) -> GatewayResult<()> {
        if let Ok(host) = std::env::var("GATEWAY_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("GATEWAY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| GatewayError::Config(format!("Invalid GATEWAY_PORT: {port}")))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let config = GatewayConfig::default();
        assert_eq!(config.server_addr().unwrap().port(), 8080);

        let mut config = GatewayConfig::default();
        config.server.host = "not a host".to_string();
        assert!(matches!(config.server_addr(), Err(GatewayError::Address(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("chart-gateway-{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let mut config = GatewayConfig::default();
        config.server.port = 9191;
        config.save_to_file(&path).unwrap();

        let loaded = GatewayConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9191);
        assert_eq!(loaded.server.host, "0.0.0.0");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: GatewayConfig = toml::from_str("[server]\nport = 7000\n").unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
