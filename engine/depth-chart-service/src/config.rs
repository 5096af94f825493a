//! Service configuration management

use anyhow::{Context, Result};
use chart_gateway::GatewayConfig;
use depth_chart::DepthChartConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_FILE_ENV: &str = "DEPTH_CHART_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Depth chart engine configuration
    pub depth_chart: DepthChartConfig,

    /// REST gateway configuration
    pub gateway: GatewayConfig,

    /// Service-level configuration
    pub service: ServiceSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Enable development mode (more verbose logging, etc.)
    pub development_mode: bool,

    /// Service startup timeout in seconds
    pub startup_timeout_secs: u64,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,

    /// Log file path (if None, logs to stdout)
    pub file: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { development_mode: false, startup_timeout_secs: 30, shutdown_timeout_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string(), file: None }
    }
}

/// Load configuration from an optional file and environment variables.
///
/// The file is `path` if given, else `$DEPTH_CHART_CONFIG` if set. Environment
/// variables override file values.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let path = path.map(Path::to_path_buf).or_else(|| std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from));

    let mut config = match &path {
        Some(path) => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            load_from_file(path)?
        }
        None => ServiceConfig::default(),
    };

    // Override with environment variables
    load_from_env(&mut config)?;

    // Validate configuration
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {:?}", path);
    }

    config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .and_then(|c| c.try_deserialize::<ServiceConfig>())
        .with_context(|| format!("Failed to parse configuration file: {:?}", path))
}

/// Load configuration from environment variables
fn load_from_env(config: &mut ServiceConfig) -> Result<()> {
    if let Ok(level) = std::env::var("DEPTH_CHART_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("DEPTH_CHART_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(file) = std::env::var("DEPTH_CHART_LOG_FILE") {
        config.logging.file = Some(PathBuf::from(file));
    }

    if let Ok(dev_mode) = std::env::var("DEPTH_CHART_DEV_MODE") {
        config.service.development_mode = dev_mode.parse().unwrap_or(false);
    }

    if let Ok(timeout) = std::env::var("DEPTH_CHART_SHUTDOWN_TIMEOUT_SECS") {
        config.service.shutdown_timeout_secs =
            timeout.parse().with_context(|| format!("Invalid shutdown timeout: {timeout}"))?;
    }

    config.depth_chart.apply_env().context("Invalid depth chart environment")?;
    config.gateway.apply_env().context("Invalid gateway environment")?;

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    // Validate log level
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    // Validate log format
    match config.logging.format.as_str() {
        "json" | "pretty" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.service.shutdown_timeout_secs == 0 {
        return Err(anyhow::anyhow!("Shutdown timeout must be at least one second"));
    }

    config.depth_chart.validate().context("Invalid depth chart configuration")?;
    config.gateway.server_addr().context("Invalid gateway address")?;

    Ok(())
}

/// Save configuration to a file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
