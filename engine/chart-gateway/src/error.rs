//! Error types for the ChartGateway

use thiserror::Error;

/// Errors that can occur while configuring or running the ChartGateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid server address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Depth chart error: {0}")]
    DepthChart(#[from] depth_chart::DepthChartError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ChartGateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
