//! Standalone REST API server for local development

use anyhow::Context;
use chart_gateway::{ChartGateway, GatewayConfig};
use depth_chart::{ChartStore, DepthChartConfig, InMemoryChartStore, PgChartStore, ServiceRegistry, StoreBackend};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting REST API server...");

    let chart_config = DepthChartConfig::from_env().context("Failed to read depth chart config")?;
    chart_config.validate().context("Invalid depth chart config")?;

    let store: Arc<dyn ChartStore> = match chart_config.store {
        StoreBackend::Memory => Arc::new(InMemoryChartStore::new()),
        StoreBackend::Postgres => {
            let store = PgChartStore::connect(&chart_config.database)
                .await
                .context("Failed to connect to database")?;
            store.run_migrations().await.context("Failed to run migrations")?;
            Arc::new(store)
        }
    };
    info!("Using {} chart store", store.backend_name());

    let registry = Arc::new(ServiceRegistry::from_config(&chart_config, store)?);

    let mut config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => GatewayConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load gateway config from {path}"))?,
        Err(_) => GatewayConfig::default(),
    };
    config.apply_env()?;

    let gateway = ChartGateway::new(config, registry);
    gateway
        .start(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Ctrl+C received, stopping REST API server");
        })
        .await?;

    Ok(())
}
