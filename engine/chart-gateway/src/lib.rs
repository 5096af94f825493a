//! ChartGateway - REST API for depth chart management
//!
//! This module provides the external HTTP interface of the depth chart engine,
//! resolving each request's sport and team through the service registry and
//! mapping depth chart failures onto HTTP status codes.

pub mod config;
pub mod error;
pub mod gateway;
pub mod rest_api;

pub use config::{GatewayConfig, ServerConfig};
pub use error::{GatewayError, GatewayResult};
pub use gateway::ChartGateway;

/// Version of the ChartGateway API
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;
