//! # Depth Chart
//!
//! Per-position depth chart ranking for sports teams.
//!
//! ## Architecture
//!
//! - **ranking**: pure insert/remove/backups planning over one position group
//! - **DepthChartService**: validation, per-group locking and persistence
//! - **ChartStore**: storage trait with in-memory and PostgreSQL backends
//! - **ServiceRegistry**: sport+team lookup of handlers
//!
//! Ranks within a position group are always dense: a group of N players holds
//! depths 1..N exactly once each.
//!
//! ## Usage
//!
//! ```rust
//! use depth_chart::{
//!     builtin_registrations, AddPlayerRequest, ChartPeriod, InMemoryChartStore, ServiceRegistry,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryChartStore::new());
//!     let registry = ServiceRegistry::new(builtin_registrations(ChartPeriod::default()), store)?;
//!
//!     let chart = registry.resolve("NFL", "TampaBayBuccaneers")?;
//!     chart
//!         .add_player("TampaBayBuccaneers", AddPlayerRequest::new("QB", 12, "Tom Brady"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod locks;
pub mod period;
pub mod postgres;
pub mod ranking;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;


pub use config::{DatabaseConfig, DepthChartConfig, SportConfig, StoreBackend};
pub use error::{DepthChartError, Result, StoreError, StoreResult};
pub use period::ChartPeriod;
pub use postgres::PgChartStore;
pub use registry::{builtin_registrations, ServiceRegistry, SportRegistration};
pub use service::{DepthChartOps, DepthChartService, SportProfile};
pub use store::{ChartStore, InMemoryChartStore};
pub use types::{
    AddPlayerRequest, ChartEntry, FullDepthChart, GroupKey, PlayerRequest, PlayerSummary,
    PositionChart, PositionDepth,
};

pub use chrono::NaiveDate;

/// Current version of the depth chart engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
