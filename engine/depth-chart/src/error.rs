//! Error types for the depth chart engine and its storage

use thiserror::Error;

/// Result type alias for depth chart operations
pub type Result<T> = std::result::Result<T, DepthChartError>;

/// Result type alias for chart store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced to callers of the depth chart service
#[derive(Error, Debug)]
pub enum DepthChartError {
    /// A required field is absent or empty
    #[error("{0} is required")]
    MissingArgument(&'static str),

    /// A numeric field is below its allowed minimum
    #[error("{field} must be at least 1, got {value}")]
    InvalidRange { field: &'static str, value: i32 },

    /// No service is registered for the sport and team
    #[error("No depth chart service for sport: {sport_code}, team: {team_code}")]
    UnconfiguredTeam { sport_code: String, team_code: String },

    /// The player is not listed in the position group
    #[error("Player {player_id} is not in position {position_code}")]
    PlayerNotInPosition { position_code: String, player_id: i32 },

    /// The player is already listed in the position group
    #[error("Player {player_id} is already in position {position_code}")]
    DuplicatePlayer { position_code: String, player_id: i32 },

    /// The chart store failed to read or write
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DepthChartError {
    /// True for errors caused by the request itself
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument(_) | Self::InvalidRange { .. } | Self::DuplicatePlayer { .. }
        )
    }
}

/// Errors raised by chart store backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored ranks break the dense 1..N sequence
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// A row expected by a persist call does not exist
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A row written by a persist call already exists
    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    /// Another writer changed the group between fetch and persist
    #[error("Concurrent modification: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Create a new corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new already exists error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a new conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
