//! Depth Chart Production Service
//!
//! This is the main entry point for the depth chart platform. It loads
//! configuration, builds the chart store and service registry, serves the
//! REST gateway and provides graceful shutdown handling.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use depth_chart::{PgChartStore, StoreBackend};
use depth_chart_service::{
    graceful_shutdown, initialize_logging, load_configuration, setup_signal_handlers, ServiceState,
};

#[derive(Parser)]
#[command(name = "depth-chart")]
#[command(about = "Depth chart service for sports teams")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file (overrides DEPTH_CHART_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the service (default)
    Serve,

    /// Print the effective configuration as TOML and exit
    CheckConfig,

    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = load_configuration(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::CheckConfig => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{rendered}");
            Ok(())
        }
        Commands::Migrate => {
            if config.depth_chart.store != StoreBackend::Postgres {
                anyhow::bail!("Migrations require the postgres store backend");
            }
            let store = PgChartStore::connect(&config.depth_chart.database)
                .await
                .context("Failed to connect to the database")?;
            store.run_migrations().await.context("Failed to run database migrations")?;
            println!("Migrations applied");
            Ok(())
        }
    }
}

async fn serve(config: depth_chart_service::ServiceConfig) -> Result<()> {
    // Initialize logging before any component starts
    let _log_guard = initialize_logging(&config.logging, config.service.development_mode)?;

    info!("Starting Depth Chart Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded successfully ({:?} store)", config.depth_chart.store);

    // Create service state
    let service_state = Arc::new(ServiceState::new(config).await?);
    info!("Service state initialized");

    // Setup signal handlers for graceful shutdown
    let shutdown_signal = setup_signal_handlers()?;
    info!("Signal handlers configured");

    // Start the ChartGateway in a separate task
    let gateway_handle = service_state.start_chart_gateway().await?;

    // Wait for shutdown signal
    info!("Depth Chart Service is running. Press Ctrl+C to shutdown gracefully.");
    let _ = shutdown_signal.await;

    // Graceful shutdown
    info!("Shutdown signal received. Initiating graceful shutdown...");
    graceful_shutdown(service_state, gateway_handle).await?;

    info!("Depth Chart Service shutdown complete");
    Ok(())
}
