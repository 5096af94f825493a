//! Service state management and component initialization

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, RwLock};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use chart_gateway::ChartGateway;
use depth_chart::{
    ChartStore, DatabaseConfig, InMemoryChartStore, PgChartStore, ServiceRegistry, StoreBackend,
};

/// Service state containing all initialized components
pub struct ServiceState {
    /// Service configuration
    pub config: ServiceConfig,

    /// Chart store shared by every registered handler
    pub store: Arc<dyn ChartStore>,

    /// PostgreSQL store, kept to close its pool on shutdown
    pg_store: Option<PgChartStore>,

    /// Sport+team handlers
    pub registry: Arc<ServiceRegistry>,

    /// Stops the gateway's server loop
    gateway_shutdown: Mutex<Option<oneshot::Sender<()>>>,

    /// Service running state
    pub is_running: Arc<RwLock<bool>>,

    /// Address the gateway actually bound
    bound_addr: RwLock<Option<SocketAddr>>,

    /// Startup time
    pub started_at: DateTime<Utc>,
}

impl ServiceState {
    /// Create a new service state with all components initialized
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing service components...");

        let (store, pg_store): (Arc<dyn ChartStore>, Option<PgChartStore>) =
            match config.depth_chart.store {
                StoreBackend::Memory => {
                    info!("Using in-memory chart store");
                    (Arc::new(InMemoryChartStore::new()), None)
                }
                StoreBackend::Postgres => {
                    info!("Connecting PostgreSQL chart store...");
                    let startup_timeout = Duration::from_secs(config.service.startup_timeout_secs);
                    let pg = tokio::time::timeout(
                        startup_timeout,
                        connect_and_migrate(&config.depth_chart.database),
                    )
                    .await
                    .context("Timed out connecting to and migrating the database")??;
                    (Arc::new(pg.clone()), Some(pg))
                }
            };

        info!("Initializing ServiceRegistry...");
        let registry = Arc::new(
            ServiceRegistry::from_config(&config.depth_chart, store.clone())
                .context("Failed to build service registry")?,
        );
        info!("ServiceRegistry initialized with {} teams", registry.len());

        Ok(Self {
            config,
            store,
            pg_store,
            registry,
            gateway_shutdown: Mutex::new(None),
            is_running: Arc::new(RwLock::new(false)),
            bound_addr: RwLock::new(None),
            started_at: Utc::now(),
        })
    }

    /// Bind the ChartGateway and serve it on a spawned task
    pub async fn start_chart_gateway(&self) -> Result<tokio::task::JoinHandle<()>> {
        info!("Starting ChartGateway...");

        let mut shutdown_guard = self.gateway_shutdown.lock().await;
        if shutdown_guard.is_some() {
            anyhow::bail!("ChartGateway is already running");
        }

        let gateway = ChartGateway::new(self.config.gateway.clone(), self.registry.clone());
        let addr = self.config.gateway.server_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let (bound_addr, server) = gateway
            .bind(addr, async {
                rx.await.ok();
            })
            .context("Failed to bind ChartGateway")?;

        *shutdown_guard = Some(tx);
        *self.is_running.write().await = true;

        let is_running = self.is_running.clone();
        let handle = tokio::spawn(async move {
            server.await;
            *is_running.write().await = false;
        });

        *self.bound_addr.write().await = Some(bound_addr);
        info!("ChartGateway started successfully on {}", bound_addr);
        Ok(handle)
    }

    /// Address the gateway is listening on, once started
    pub async fn gateway_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.read().await
    }

    /// Ask the ChartGateway to stop accepting requests
    pub async fn stop_chart_gateway(&self) -> Result<()> {
        info!("Stopping ChartGateway...");

        match self.gateway_shutdown.lock().await.take() {
            Some(tx) => {
                if tx.send(()).is_err() {
                    warn!("ChartGateway had already stopped");
                }
                info!("ChartGateway stop signal sent");
            }
            None => warn!("ChartGateway was not running"),
        }

        Ok(())
    }

    /// Check if the service is running
    pub async fn is_running(&self) -> bool {
        let running = self.is_running.read().await;
        *running
    }

    /// Get service health status
    pub async fn health_check(&self) -> ServiceHealth {
        if !self.is_running().await {
            return ServiceHealth::Unhealthy;
        }

        if let Some(pg) = &self.pg_store {
            if pg.pool().is_closed() {
                return ServiceHealth::Degraded;
            }
        }

        ServiceHealth::Healthy
    }

    /// Time since the service state was created
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// Graceful shutdown of all components
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down service components...");

        if let Some(pg) = &self.pg_store {
            info!("Closing database pool...");
            pg.pool().close().await;
        }

        info!("Service components shut down after {}s", self.uptime().num_seconds());
        Ok(())
    }
}

/// Connect the PostgreSQL store and bring its schema up to date
async fn connect_and_migrate(database: &DatabaseConfig) -> Result<PgChartStore> {
    let pg = PgChartStore::connect(database).await.context("Failed to connect to the database")?;
    pg.run_migrations().await.context("Failed to run database migrations")?;
    Ok(pg)
}

/// Service health status
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceHealth {
    Healthy,
    Unhealthy,
    Degraded,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceHealth::Healthy)
    }
}
