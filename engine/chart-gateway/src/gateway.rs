//! Main ChartGateway implementation

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::rest_api;

use depth_chart::ServiceRegistry;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// HTTP front end over a service registry
pub struct ChartGateway {
    /// Gateway configuration
    config: GatewayConfig,

    /// Sport+team handlers served by the routes
    registry: Arc<ServiceRegistry>,

    /// Running state
    is_running: Arc<RwLock<bool>>,
}

impl ChartGateway {
    /// Create a new ChartGateway
    pub fn new(config: GatewayConfig, registry: Arc<ServiceRegistry>) -> Self {
        Self { config, registry, is_running: Arc::new(RwLock::new(false)) }
    }

    /// Serve until `shutdown` resolves
    pub async fn start(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> GatewayResult<()> {
        let addr = self.config.server_addr()?;
        let (_, server) = self.bind(addr, shutdown)?;
        server.await;
        Ok(())
    }

    /// Bind the listener and return the address actually bound plus the serving future
    pub fn bind(
        &self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> GatewayResult<(SocketAddr, impl Future<Output = ()>)> {
        let routes = rest_api::create_routes(self.registry.clone());

        let (bound_addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map_err(|e| GatewayError::Config(format!("Failed to bind {addr}: {e}")))?;

        info!("ChartGateway listening on {} ({} teams registered)", bound_addr, self.registry.len());

        let is_running = self.is_running.clone();
        Ok((bound_addr, async move {
            *is_running.write().await = true;
            server.await;
            *is_running.write().await = false;
            info!("ChartGateway stopped");
        }))
    }

    /// Whether the server future is currently running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
